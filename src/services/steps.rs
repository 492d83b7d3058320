//! Collapsing of repeated steps.
//!
//! Loops in tests tend to record the same leaf step hundreds of times. Runs
//! of identical, error-free, childless steps are folded into one entry that
//! carries a repetition count and the summed duration.

use crate::models::input::StepNode;

/// A step of the input tree together with how many consecutive copies of it
/// were folded into it.
#[derive(Debug, Clone, Copy)]
pub struct DedupedStep<'a> {
    pub step: &'a StepNode,
    pub count: u32,
    pub duration: i64,
}

impl<'a> DedupedStep<'a> {
    fn new(step: &'a StepNode) -> Self {
        DedupedStep {
            step,
            count: 1,
            duration: step.duration,
        }
    }
}

/// Whether a step may absorb or be absorbed by an identical neighbour.
fn is_mergeable(step: &StepNode) -> bool {
    step.error.is_none()
        && step.duration >= 0
        && step
            .location
            .as_ref()
            .is_some_and(|loc| !loc.file.as_os_str().is_empty())
        && step.steps.is_empty()
}

fn same_step(a: &StepNode, b: &StepNode) -> bool {
    a.category == b.category && a.title == b.title && a.location == b.location
}

/// Fold runs of identical sibling steps.
///
/// Only the given level is folded; callers apply this again to the children
/// of every emitted step. Order of first occurrence is preserved.
pub fn dedupe_steps(steps: &[StepNode]) -> Vec<DedupedStep<'_>> {
    let mut result: Vec<DedupedStep<'_>> = Vec::with_capacity(steps.len());
    // Index into `result` of the entry later steps may still merge into
    let mut open: Option<usize> = None;

    for step in steps {
        let mergeable = is_mergeable(step);

        if mergeable
            && let Some(index) = open
            && same_step(result[index].step, step)
        {
            let entry = &mut result[index];
            entry.count += 1;
            entry.duration += step.duration;
            continue;
        }

        result.push(DedupedStep::new(step));
        open = mergeable.then_some(result.len() - 1);
    }

    result
}
