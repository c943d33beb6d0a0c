//! List transitions layered over rendering.
//!
//! An `Animator` only ever looks at the id sequences of two consecutive
//! frames and describes how rows should move between them. It cannot see or
//! change the collection, so swapping `AutoAnimate` for `NoAnimation` leaves
//! every data property untouched.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::Deserialize;

use crate::config::AnimationConfig;
use crate::types::TodoId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
}

/// How rows change between two rendered frames.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionPlan {
    pub entering: Vec<TodoId>,
    pub leaving: Vec<TodoId>,
    /// Rows present in both frames whose relative order changed.
    pub moved: Vec<TodoId>,
    pub duration: Duration,
    pub easing: Option<Easing>,
}

impl TransitionPlan {
    pub fn is_empty(&self) -> bool {
        self.entering.is_empty() && self.leaving.is_empty() && self.moved.is_empty()
    }
}

pub trait Animator {
    fn plan(&mut self, previous: &[TodoId], current: &[TodoId]) -> TransitionPlan;
}

/// Rows swap instantly.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnimation;

impl Animator for NoAnimation {
    fn plan(&mut self, _previous: &[TodoId], _current: &[TodoId]) -> TransitionPlan {
        TransitionPlan::default()
    }
}

/// Fades rows in and out and slides reordered rows, in the manner of
/// auto-animate: a fixed duration applied to every membership change.
#[derive(Debug, Clone, Copy)]
pub struct AutoAnimate {
    pub duration: Duration,
    pub easing: Easing,
}

impl Default for AutoAnimate {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(250),
            easing: Easing::EaseInOut,
        }
    }
}

impl Animator for AutoAnimate {
    fn plan(&mut self, previous: &[TodoId], current: &[TodoId]) -> TransitionPlan {
        let before: HashSet<&TodoId> = previous.iter().collect();
        let after: HashSet<&TodoId> = current.iter().collect();

        let entering: Vec<TodoId> = current.iter().filter(|id| !before.contains(id)).copied().collect();
        let leaving: Vec<TodoId> = previous.iter().filter(|id| !after.contains(id)).copied().collect();

        // Compare positions among the rows both frames share.
        let kept_before: Vec<&TodoId> = previous.iter().filter(|id| after.contains(id)).collect();
        let rank: HashMap<&TodoId, usize> = kept_before.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let moved: Vec<TodoId> = current
            .iter()
            .filter(|id| before.contains(id))
            .enumerate()
            .filter(|(i, id)| rank.get(id) != Some(i))
            .map(|(_, id)| *id)
            .collect();

        let mut plan = TransitionPlan {
            entering,
            leaving,
            moved,
            ..TransitionPlan::default()
        };
        if !plan.is_empty() {
            plan.duration = self.duration;
            plan.easing = Some(self.easing);
        }
        plan
    }
}

/// The animator a config asks for.
pub fn from_config(config: &AnimationConfig) -> Box<dyn Animator> {
    if config.enabled {
        Box::new(AutoAnimate {
            duration: config.duration(),
            easing: config.easing,
        })
    } else {
        Box::new(NoAnimation)
    }
}
