use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A directed "follows" relationship. At most one edge exists per ordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub following_id: UserId,
}

impl FollowEdge {
    pub fn new(follower_id: impl Into<UserId>, following_id: impl Into<UserId>) -> Self {
        Self {
            follower_id: follower_id.into(),
            following_id: following_id.into(),
        }
    }
}

impl std::fmt::Display for FollowEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.follower_id, self.following_id)
    }
}

/// A user reachable through the people someone already follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub user_id: UserId,
    /// How many of the requester's followees follow `user_id`.
    pub mutual_followers: u64,
}

impl Recommendation {
    pub fn new(user_id: impl Into<UserId>, mutual_followers: u64) -> Self {
        Self {
            user_id: user_id.into(),
            mutual_followers,
        }
    }

    /// Human-readable explanation shown next to the suggestion.
    pub fn reason(&self) -> String {
        format!("Followed by {} people you follow", self.mutual_followers)
    }
}
