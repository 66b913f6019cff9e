//! Execution planner - groups actions by whether they may be applied

use crate::action::Action;

/// An execution plan with actions grouped by destructiveness
#[derive(Debug)]
pub struct ExecutionPlan<A> {
    /// Actions applied immediately, in order
    pub additive: Vec<A>,
    /// Actions surfaced to the operator, never applied
    pub destructive: Vec<A>,
}

impl<A: Action> ExecutionPlan<A> {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self {
            additive: Vec::new(),
            destructive: Vec::new(),
        }
    }

    /// Add an action to the plan, classifying it by [`Action::is_destructive`]
    pub fn add(&mut self, action: A) {
        if action.is_destructive() {
            self.destructive.push(action);
        } else {
            self.additive.push(action);
        }
    }

    /// Total number of actions in the plan
    pub fn total_actions(&self) -> usize {
        self.additive.len() + self.destructive.len()
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.additive.is_empty() && self.destructive.is_empty()
    }

    /// Check if plan has anything the operator must run by hand
    pub fn has_destructive(&self) -> bool {
        !self.destructive.is_empty()
    }
}

impl<A: Action> Default for ExecutionPlan<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> Extend<A> for ExecutionPlan<A> {
    fn extend<I: IntoIterator<Item = A>>(&mut self, iter: I) {
        for action in iter {
            self.add(action);
        }
    }
}

impl<A: Action> FromIterator<A> for ExecutionPlan<A> {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let mut plan = Self::new();
        plan.extend(iter);
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ApplyContext;
    use crate::types::ApplyResult;
    use anyhow::Result;

    #[derive(Debug)]
    enum Step {
        Keep(&'static str),
        Drop(&'static str),
    }

    impl Action for Step {
        type Target = ();

        fn id(&self) -> String {
            match self {
                Self::Keep(id) | Self::Drop(id) => (*id).to_string(),
            }
        }

        fn description(&self) -> String {
            self.id()
        }

        fn command(&self) -> String {
            self.id()
        }

        fn is_destructive(&self) -> bool {
            matches!(self, Self::Drop(_))
        }

        fn apply(&self, _target: &(), _ctx: &ApplyContext) -> Result<ApplyResult> {
            Ok(ApplyResult::Created)
        }
    }

    #[test]
    fn test_plan_classifies_actions() {
        let plan: ExecutionPlan<Step> =
            vec![Step::Keep("a"), Step::Drop("b"), Step::Keep("c")].into_iter().collect();

        assert_eq!(plan.additive.len(), 2);
        assert_eq!(plan.destructive.len(), 1);
        assert_eq!(plan.total_actions(), 3);
        assert!(plan.has_destructive());
    }

    #[test]
    fn test_empty_plan() {
        let plan: ExecutionPlan<Step> = ExecutionPlan::new();
        assert!(plan.is_empty());
        assert!(!plan.has_destructive());
    }
}
