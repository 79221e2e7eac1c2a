//! Plan trees.
//!
//! A plan is immutable once built and can be executed any number of times.
//! Execution returns only after every dispatch in the tree has finished.

use std::collections::BTreeMap;
use std::fmt;

use futures::future::BoxFuture;
use reactor_core::{Mode, ReactorError, Result};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{error, info_span, Instrument};

use crate::context::ExecContext;
use crate::dispatch::Dispatcher;

pub use crate::dispatch::TargetKind;

/// A node of the call tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plan {
    /// Repeat one dispatch.
    Block(Block),
    /// Combine two sub-plans.
    Operator(Operator),
}

impl Plan {
    /// Textual form of the tree.
    pub fn describe(&self) -> String {
        match self {
            Plan::Block(block) => block.describe(),
            Plan::Operator(operator) => operator.describe(),
        }
    }

    /// Run the tree to completion.
    ///
    /// Transport failures are swallowed by the dispatcher. An unknown mode or
    /// combinator aborts the subtree it belongs to and is returned.
    pub fn execute<'a>(
        &'a self,
        ctx: &'a ExecContext,
        dispatcher: &'a Dispatcher,
    ) -> BoxFuture<'a, Result<()>> {
        match self {
            Plan::Block(block) => Box::pin(block.execute(ctx, dispatcher)),
            Plan::Operator(operator) => Box::pin(operator.execute(ctx, dispatcher)),
        }
    }

    /// Check every node for an executable mode without dispatching anything.
    pub fn validate(&self) -> Result<()> {
        match self {
            Plan::Block(block) => block.mode.ensure_known("block"),
            Plan::Operator(operator) => {
                operator.combinator.ensure_known("operator")?;
                operator.left.validate()?;
                operator.right.validate()
            }
        }
    }

    /// Number of dispatches one execution performs.
    pub fn dispatch_count(&self) -> usize {
        match self {
            Plan::Block(block) => block.times,
            Plan::Operator(operator) => {
                operator.left.dispatch_count() + operator.right.dispatch_count()
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<Block> for Plan {
    fn from(block: Block) -> Self {
        Plan::Block(block)
    }
}

impl From<Operator> for Plan {
    fn from(operator: Operator) -> Self {
        Plan::Operator(operator)
    }
}

/// Leaf node: `times` dispatches to one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BlockSpec")]
pub struct Block {
    times: usize,
    mode: Mode,
    target: String,
    annotations: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct BlockSpec {
    times: usize,
    mode: Mode,
    target: String,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

impl TryFrom<BlockSpec> for Block {
    type Error = ReactorError;

    fn try_from(spec: BlockSpec) -> Result<Self> {
        let mut block = Block::new(spec.times, spec.mode, spec.target)?;
        block.annotations = spec.annotations;
        Ok(block)
    }
}

impl Block {
    /// Create a block. The target must not be empty.
    pub fn new(times: usize, mode: Mode, target: impl Into<String>) -> Result<Self> {
        let target = target.into();
        if target.is_empty() {
            return Err(ReactorError::MalformedTarget {
                message: "block target must not be empty".to_string(),
            });
        }

        Ok(Self {
            times,
            mode,
            target,
            annotations: BTreeMap::new(),
        })
    }

    /// Attach a display-only annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn times(&self) -> usize {
        self.times
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    /// Whether this block calls an element or an orbit.
    pub fn kind(&self) -> TargetKind {
        TargetKind::classify(&self.target)
    }

    /// `<times><mode>[<target>]` followed by `,key:value` per annotation.
    pub fn describe(&self) -> String {
        let mut s = format!("{}{}[{}]", self.times, self.mode.token(), self.target);
        for (key, value) in &self.annotations {
            s.push_str(&format!(",{}:{}", key, value));
        }
        s
    }

    /// Perform the dispatches according to the block's mode.
    pub async fn execute(&self, ctx: &ExecContext, dispatcher: &Dispatcher) -> Result<()> {
        let kind = self.kind();
        let span = info_span!(
            "reactor.block",
            plan = %self.describe(),
            execution_id = %ctx.execution_id()
        );

        match &self.mode {
            Mode::Sequential => {
                async {
                    for _ in 0..self.times {
                        dispatch(dispatcher, ctx, kind, &self.target).await;
                    }
                }
                .instrument(span)
                .await;
                Ok(())
            }
            Mode::Concurrent => {
                async {
                    let mut tasks = JoinSet::new();
                    for _ in 0..self.times {
                        let dispatcher = dispatcher.clone();
                        let ctx = ctx.clone();
                        let target = self.target.clone();
                        tasks.spawn(
                            async move { dispatch(&dispatcher, &ctx, kind, &target).await }
                                .in_current_span(),
                        );
                    }

                    while let Some(joined) = tasks.join_next().await {
                        if let Err(e) = joined {
                            error!(error = %e, "dispatch task did not complete");
                        }
                    }
                }
                .instrument(span)
                .await;
                Ok(())
            }
            Mode::Unknown(raw) => Err(ReactorError::unsupported_mode("block", raw)),
        }
    }
}

async fn dispatch(dispatcher: &Dispatcher, ctx: &ExecContext, kind: TargetKind, target: &str) {
    match kind {
        TargetKind::Element => {
            dispatcher
                .call_element(ctx, target)
                .instrument(info_span!("reactor.block.call_element", symbol = %target))
                .await
        }
        TargetKind::Orbit => {
            dispatcher
                .call_orbit(ctx, target)
                .instrument(info_span!("reactor.block.call_orbit", molecule = %target))
                .await
        }
    }
}

/// Binary node: two sub-plans under one combinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    left: Box<Plan>,
    right: Box<Plan>,
    combinator: Mode,
}

impl Operator {
    pub fn new(left: impl Into<Plan>, combinator: Mode, right: impl Into<Plan>) -> Self {
        Self {
            left: Box::new(left.into()),
            right: Box::new(right.into()),
            combinator,
        }
    }

    /// Run `left` to completion, then `right`.
    pub fn sequential(left: impl Into<Plan>, right: impl Into<Plan>) -> Self {
        Self::new(left, Mode::Sequential, right)
    }

    /// Run `left` and `right` at the same time.
    pub fn concurrent(left: impl Into<Plan>, right: impl Into<Plan>) -> Self {
        Self::new(left, Mode::Concurrent, right)
    }

    pub fn left(&self) -> &Plan {
        &self.left
    }

    pub fn right(&self) -> &Plan {
        &self.right
    }

    pub fn combinator(&self) -> &Mode {
        &self.combinator
    }

    /// `<left><separator><right>`, the separator naming the combinator.
    ///
    /// No grouping is written, so once operators nest different trees can
    /// render the same string: `(a*b)+c` and `a*(b+c)` both print `a*b+c`.
    /// The form is for display and logs, not for rebuilding a plan.
    pub fn describe(&self) -> String {
        format!(
            "{}{}{}",
            self.left.describe(),
            self.combinator.separator(),
            self.right.describe()
        )
    }

    /// Run both children according to the combinator.
    ///
    /// Sequentially, a failing left child stops the right one from starting.
    /// Concurrently, both children always run to completion before the first
    /// error is returned.
    pub async fn execute(&self, ctx: &ExecContext, dispatcher: &Dispatcher) -> Result<()> {
        let span = info_span!(
            "reactor.operator",
            combinator = %self.combinator,
            execution_id = %ctx.execution_id()
        );

        match &self.combinator {
            Mode::Sequential => {
                async {
                    execute_child(&self.left, "left", ctx, dispatcher).await?;
                    execute_child(&self.right, "right", ctx, dispatcher).await
                }
                .instrument(span)
                .await
            }
            Mode::Concurrent => {
                async {
                    let (left, right) = tokio::join!(
                        execute_child(&self.left, "left", ctx, dispatcher),
                        execute_child(&self.right, "right", ctx, dispatcher),
                    );
                    left.and(right)
                }
                .instrument(span)
                .await
            }
            Mode::Unknown(raw) => Err(ReactorError::unsupported_mode("operator", raw)),
        }
    }
}

async fn execute_child(
    plan: &Plan,
    side: &'static str,
    ctx: &ExecContext,
    dispatcher: &Dispatcher,
) -> Result<()> {
    plan.execute(ctx, dispatcher)
        .instrument(info_span!("reactor.operator.execute", side))
        .await
}
