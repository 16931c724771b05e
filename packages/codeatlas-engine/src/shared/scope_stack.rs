//! Lexical scope stack used by the FQN builder during extraction

/// Tracks the enclosing scopes while walking a syntax tree
#[derive(Debug, Default, Clone)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

#[derive(Debug, Clone)]
pub struct ScopeFrame {
    pub name: String,
    pub is_class: bool,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root the stack at the module path derived from the file path
    pub fn with_module(module_path: &str) -> Self {
        let mut stack = Self::new();
        if !module_path.is_empty() {
            stack.push(module_path, false);
        }
        stack
    }

    pub fn push(&mut self, name: impl Into<String>, is_class: bool) {
        self.frames.push(ScopeFrame {
            name: name.into(),
            is_class,
        });
    }

    pub fn pop(&mut self) -> Option<ScopeFrame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True when the nearest enclosing scope is a class body
    pub fn is_inside_class(&self) -> bool {
        self.frames.last().is_some_and(|f| f.is_class)
    }

    /// Dotted FQN for a symbol declared in the current scope
    pub fn qualify(&self, name: &str) -> String {
        if self.frames.is_empty() {
            name.to_string()
        } else {
            let mut fqn = self
                .frames
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(".");
            fqn.push('.');
            fqn.push_str(name);
            fqn
        }
    }
}
