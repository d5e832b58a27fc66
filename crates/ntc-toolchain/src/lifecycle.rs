//! Backend construction stages.
//!
//! A backend walks these stages exactly once, in order, inside its
//! constructor. Only a backend that reached [`Stage::Ready`] is handed out.

use crate::error::{Result, ToolchainError};

/// Construction stage of a toolchain backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    BaseFlagsSet,
    PlatformExtended,
    PathsResolved,
    RulesRegistered,
    Ready,
}

impl Stage {
    /// The only stage reachable from `self`.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Uninitialized => Some(Stage::BaseFlagsSet),
            Stage::BaseFlagsSet => Some(Stage::PlatformExtended),
            Stage::PlatformExtended => Some(Stage::PathsResolved),
            Stage::PathsResolved => Some(Stage::RulesRegistered),
            Stage::RulesRegistered => Some(Stage::Ready),
            Stage::Ready => None,
        }
    }
}

/// Tracks the stage of one backend under construction.
#[derive(Debug)]
pub struct Lifecycle {
    backend: &'static str,
    stage: Stage,
}

impl Lifecycle {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            stage: Stage::Uninitialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to `to`, which must be the immediate successor of the current stage.
    pub fn advance(&mut self, to: Stage) -> Result<()> {
        if self.stage.next() != Some(to) {
            return Err(ToolchainError::Lifecycle {
                from: self.stage,
                to,
            });
        }
        tracing::debug!(backend = self.backend, stage = ?to, "toolchain stage");
        self.stage = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_all_stages_in_order() {
        let mut lc = Lifecycle::new("test");
        let mut stage = Stage::Uninitialized;
        while let Some(next) = stage.next() {
            lc.advance(next).unwrap();
            stage = next;
        }
        assert_eq!(lc.stage(), Stage::Ready);
    }

    #[test]
    fn rejects_skipped_stage() {
        let mut lc = Lifecycle::new("test");
        let err = lc.advance(Stage::PlatformExtended).unwrap_err();
        assert!(matches!(
            err,
            ToolchainError::Lifecycle {
                from: Stage::Uninitialized,
                to: Stage::PlatformExtended
            }
        ));
    }

    #[test]
    fn rejects_repeat_and_reverse() {
        let mut lc = Lifecycle::new("test");
        lc.advance(Stage::BaseFlagsSet).unwrap();
        assert!(lc.advance(Stage::BaseFlagsSet).is_err());
        assert!(lc.advance(Stage::Uninitialized).is_err());
        assert_eq!(lc.stage(), Stage::BaseFlagsSet);
    }

    #[test]
    fn ready_is_terminal() {
        assert_eq!(Stage::Ready.next(), None);
    }
}
