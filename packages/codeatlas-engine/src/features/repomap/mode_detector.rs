//! Smart-Mode detector
//!
//! Deterministic rule chain, evaluated strictly in order; the first match
//! wins. Same context in, same mode out, so callers may cache on the context.

use tracing::debug;

use super::domain::{ActivationMode, AnalysisType, ModeDetectionContext};

/// Repositories below this size run Full; everything is cheap at 10k LOC
const SMALL_REPO_LOC: usize = 10_000;

pub struct ModeDetector;

impl ModeDetector {
    pub fn detect(context: &ModeDetectionContext) -> ActivationMode {
        let mode = Self::detect_inner(context);
        debug!(?mode, "smart mode selected");
        mode
    }

    fn detect_inner(context: &ModeDetectionContext) -> ActivationMode {
        // 1. initial indexing: keep the critical path lean
        if context.is_initial_indexing {
            return ActivationMode::Fast;
        }
        // 2. explicit analysis type
        if let Some(analysis_type) = context.analysis_type {
            return match analysis_type {
                AnalysisType::BugFix => ActivationMode::Ai,
                AnalysisType::ArchitectureReview => ActivationMode::Architecture,
                AnalysisType::RefactoringPlan => ActivationMode::Full,
            };
        }
        // 3. architecture-review flag
        if context.is_architecture_review {
            return ActivationMode::Architecture;
        }
        // 4. AI-agent flag
        if context.is_ai_agent {
            return ActivationMode::Ai;
        }
        // 5. a target file implies context-relative navigation
        if context.target_file.is_some() {
            return ActivationMode::Ai;
        }
        // 6. query keyword heuristics
        if let Some(query) = &context.query {
            let query = query.to_lowercase();
            if query.contains("bug") || query.contains("fix") {
                return ActivationMode::Ai;
            }
            if query.contains("architecture") || query.contains("refactor") {
                return ActivationMode::Architecture;
            }
        }
        // 7. small repos can afford everything
        if context.repo_loc.is_some_and(|loc| loc < SMALL_REPO_LOC) {
            return ActivationMode::Full;
        }
        ActivationMode::Fast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_file_with_agent_flag_is_ai() {
        let context = ModeDetectionContext {
            target_file: Some("auth/login.rs".into()),
            is_ai_agent: true,
            ..Default::default()
        };
        assert_eq!(ModeDetector::detect(&context), ActivationMode::Ai);
    }

    #[test]
    fn initial_indexing_is_fast_and_wins_over_everything() {
        let context = ModeDetectionContext {
            is_initial_indexing: true,
            is_architecture_review: true,
            analysis_type: Some(AnalysisType::RefactoringPlan),
            ..Default::default()
        };
        assert_eq!(ModeDetector::detect(&context), ActivationMode::Fast);
    }

    #[test]
    fn architecture_query_keyword() {
        let context = ModeDetectionContext {
            query: Some("analyze repository architecture".into()),
            ..Default::default()
        };
        assert_eq!(ModeDetector::detect(&context), ActivationMode::Architecture);
    }

    #[test]
    fn small_repo_without_flags_runs_full() {
        let context = ModeDetectionContext {
            repo_loc: Some(5000),
            ..Default::default()
        };
        assert_eq!(ModeDetector::detect(&context), ActivationMode::Full);
    }

    #[test]
    fn large_repo_without_flags_stays_fast() {
        let context = ModeDetectionContext {
            repo_loc: Some(500_000),
            ..Default::default()
        };
        assert_eq!(ModeDetector::detect(&context), ActivationMode::Fast);
    }

    #[test]
    fn explicit_analysis_type_beats_keywords() {
        let context = ModeDetectionContext {
            analysis_type: Some(AnalysisType::ArchitectureReview),
            query: Some("fix this bug".into()),
            ..Default::default()
        };
        assert_eq!(ModeDetector::detect(&context), ActivationMode::Architecture);
    }

    #[test]
    fn detection_is_deterministic() {
        let context = ModeDetectionContext {
            query: Some("refactor the parser".into()),
            repo_loc: Some(50_000),
            ..Default::default()
        };
        let first = ModeDetector::detect(&context);
        for _ in 0..10 {
            assert_eq!(ModeDetector::detect(&context), first);
        }
    }
}
