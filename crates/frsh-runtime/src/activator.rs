//! Island Activator
//!
//! Activations are queued during the scan and run later, one task at a
//! time, so the scan itself never waits on a renderer. The host pumps the
//! queue from its event loop with `run_next` or drains it with
//! `run_pending`.

use crate::root_fragment::{FragmentTarget, RootFragment};
use crate::vnode::{VNodeId, VTree};
use crate::RuntimeResult;
use frsh_dom::DomTree;
use std::collections::VecDeque;

/// Mounts a virtual node into a root fragment
pub trait Renderer {
    fn render(&mut self, vtree: &VTree, vnode: VNodeId, root: &mut RootFragment<'_>) -> RuntimeResult<()>;
}

/// A scheduled activation
#[derive(Debug, Clone)]
pub struct ActivationTask {
    pub vnode: VNodeId,
    pub target: FragmentTarget,
    /// What is being activated, for logs
    pub label: String,
}

/// FIFO of pending activations
#[derive(Debug, Default)]
pub struct ActivationQueue {
    tasks: VecDeque<ActivationTask>,
    completed: usize,
    failed: usize,
}

impl ActivationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, vnode: VNodeId, target: FragmentTarget, label: String) {
        tracing::debug!("Scheduling activation of {} ({} adopted nodes)", label, target.children.len());
        self.tasks.push_back(ActivationTask { vnode, target, label });
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks that rendered successfully so far
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Run the oldest pending task. Returns false when the queue was empty.
    pub fn run_next<R: Renderer + ?Sized>(&mut self, tree: &mut DomTree, vtree: &VTree, renderer: &mut R) -> bool {
        let Some(task) = self.tasks.pop_front() else {
            return false;
        };

        let mut root = RootFragment::new(tree, task.target);
        match renderer.render(vtree, task.vnode, &mut root) {
            Ok(()) => {
                tracing::debug!("Activated {}", task.label);
                self.completed += 1;
            }
            Err(e) => {
                tracing::error!("Activation of {} failed: {}", task.label, e);
                self.failed += 1;
            }
        }
        true
    }

    /// Run every pending task in scheduling order. Returns how many ran.
    pub fn run_pending<R: Renderer + ?Sized>(&mut self, tree: &mut DomTree, vtree: &VTree, renderer: &mut R) -> usize {
        let mut ran = 0;
        while self.run_next(tree, vtree, renderer) {
            ran += 1;
        }
        ran
    }
}
