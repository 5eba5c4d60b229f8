// Subscription gate
// Decides whether a user may submit videos. The chat platform check lives in the
// transport; this crate ships an allow-everyone gate and a static allow-list.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::settings::UserId;

#[async_trait]
pub trait MembershipCheck: Send + Sync {
    async fn is_member(&self, user: UserId) -> bool;
}

/// Everyone passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl MembershipCheck for AllowAll {
    async fn is_member(&self, _user: UserId) -> bool {
        true
    }
}

/// Only listed users pass.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    users: HashSet<UserId>,
}

impl AllowList {
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        Self { users: users.into_iter().collect() }
    }
}

#[async_trait]
impl MembershipCheck for AllowList {
    async fn is_member(&self, user: UserId) -> bool {
        self.users.contains(&user)
    }
}

/// Gate for a configured allow-list; an empty list lets everyone through.
pub fn gate_for(allowed: &HashSet<UserId>) -> Box<dyn MembershipCheck> {
    if allowed.is_empty() {
        Box::new(AllowAll)
    } else {
        Box::new(AllowList::new(allowed.iter().copied()))
    }
}
