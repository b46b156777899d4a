use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStage {
    Begin,
    Stats,
    League,
    Achievement,
    Commit,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "begin"),
            Self::Stats => write!(f, "stats"),
            Self::League => write!(f, "league"),
            Self::Achievement => write!(f, "achievement"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

#[derive(Debug)]
pub enum SyncError {
    Database { stage: SyncStage, source: sqlx::Error },
    AchievementStore { achievement_id: String, source: sqlx::Error },
}

impl SyncError {
    pub(crate) fn at(stage: SyncStage) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| Self::Database { stage, source }
    }

    pub(crate) fn for_achievement(achievement_id: &str) -> impl FnOnce(sqlx::Error) -> Self + '_ {
        move |source| Self::AchievementStore {
            achievement_id: achievement_id.to_string(),
            source,
        }
    }

    pub fn stage(&self) -> SyncStage {
        match self {
            Self::Database { stage, .. } => *stage,
            Self::AchievementStore { .. } => SyncStage::Achievement,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { stage, source } => {
                write!(f, "progress sync failed at {stage}: {source}")
            }
            Self::AchievementStore {
                achievement_id,
                source,
            } => write!(f, "progress sync failed for achievement {achievement_id}: {source}"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database { source, .. } | Self::AchievementStore { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_stage() {
        let err = SyncError::at(SyncStage::Commit)(sqlx::Error::PoolClosed);
        assert_eq!(err.stage(), SyncStage::Commit);
        assert!(err.to_string().starts_with("progress sync failed at commit"));
    }

    #[test]
    fn achievement_errors_carry_the_id() {
        let err = SyncError::for_achievement("rat-trick")(sqlx::Error::RowNotFound);
        assert_eq!(err.stage(), SyncStage::Achievement);
        assert!(err.to_string().contains("rat-trick"));
    }
}
