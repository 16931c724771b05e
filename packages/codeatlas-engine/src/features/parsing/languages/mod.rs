//! Built-in language specs

mod c_lang;
mod cpp;
mod go;
mod java;
mod kotlin;
mod python;
mod rust_lang;
mod typescript;

pub use c_lang::CSpec;
pub use cpp::CppSpec;
pub use go::GoSpec;
pub use java::JavaSpec;
pub use kotlin::KotlinSpec;
pub use python::PythonSpec;
pub use rust_lang::RustSpec;
pub use typescript::TypeScriptSpec;
