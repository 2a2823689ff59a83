use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::DomainError;

/// Paid actions that must pass the credit gate before running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeteredOperation {
    BlogOutline,
    BlogPost,
    SocialGenerate,
    SocialOptimize,
    EmailGenerate,
}

impl MeteredOperation {
    pub const ALL: [MeteredOperation; 5] = [
        MeteredOperation::BlogOutline,
        MeteredOperation::BlogPost,
        MeteredOperation::SocialGenerate,
        MeteredOperation::SocialOptimize,
        MeteredOperation::EmailGenerate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MeteredOperation::BlogOutline => "blog_outline",
            MeteredOperation::BlogPost => "blog_post",
            MeteredOperation::SocialGenerate => "social_generate",
            MeteredOperation::SocialOptimize => "social_optimize",
            MeteredOperation::EmailGenerate => "email_generate",
        }
    }
}

impl Display for MeteredOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeteredOperation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MeteredOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| DomainError::UnknownOperation(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationCosts {
    pub blog_outline: i64,
    pub blog_post: i64,
    pub social_generate: i64,
    pub social_optimize: i64,
    pub email_generate: i64,
}

impl OperationCosts {
    pub fn cost_of(&self, operation: MeteredOperation) -> i64 {
        match operation {
            MeteredOperation::BlogOutline => self.blog_outline,
            MeteredOperation::BlogPost => self.blog_post,
            MeteredOperation::SocialGenerate => self.social_generate,
            MeteredOperation::SocialOptimize => self.social_optimize,
            MeteredOperation::EmailGenerate => self.email_generate,
        }
    }
}

impl Default for OperationCosts {
    fn default() -> Self {
        Self {
            blog_outline: 1,
            blog_post: 3,
            social_generate: 1,
            social_optimize: 1,
            email_generate: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_costs() {
        let costs = OperationCosts::default();
        assert_eq!(costs.cost_of(MeteredOperation::BlogPost), 3);
        assert_eq!(costs.cost_of(MeteredOperation::BlogOutline), 1);
        assert_eq!(costs.cost_of(MeteredOperation::EmailGenerate), 1);
    }

    #[test]
    fn operation_names_round_trip_through_from_str() {
        for op in MeteredOperation::ALL {
            assert_eq!(op.as_str().parse::<MeteredOperation>().unwrap(), op);
        }
        assert!("image_search".parse::<MeteredOperation>().is_err());
    }
}
