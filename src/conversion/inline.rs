use tracing::{debug, trace};

use crate::{
    math::{Map, Set},
    pda::Pda,
};

use super::{
    graph::{InlinedNfa, NodeId},
    ConversionError,
};

type FrameId = usize;

const ROOT: FrameId = 0;

/// States of absorbed paths that are currently being explored, each paired with the frame it is
/// explored in. The same state may be passed once per frame.
type Visiting<S> = Set<(S, FrameId)>;

/// A pop that was taken in some frame. It is remembered so that the continuation behind it can
/// be explored again once the frame gains a further return target.
#[derive(Clone)]
struct PopSite<S> {
    state: S,
    receiver: NodeId,
    visiting: Visiting<S>,
}

/// One level of the call stack. `parent` is the frame the push happened in, `returns` holds all
/// frames that a pop of `token` continues in. Without recursion this is just `parent`.
struct Frame<S, I> {
    /// The pushed token together with the state that pushed it, `None` for the root.
    push: Option<(S, I)>,
    parent: Option<FrameId>,
    returns: Vec<FrameId>,
    pops: Vec<PopSite<S>>,
    memo: Map<S, NodeId>,
}

impl<S, I> Frame<S, I> {
    fn root() -> Self {
        Self {
            push: None,
            parent: None,
            returns: vec![],
            pops: vec![],
            memo: Map::default(),
        }
    }

    fn opened(state: S, token: I, parent: FrameId) -> Self {
        Self {
            push: Some((state, token)),
            parent: Some(parent),
            returns: vec![parent],
            pops: vec![],
            memo: Map::default(),
        }
    }

    fn token(&self) -> Option<&I> {
        self.push.as_ref().map(|(_, token)| token)
    }
}

struct Inliner<'a, P: Pda, K> {
    pda: &'a P,
    keep: K,
    start: P::State,
    stop: P::State,
    frames: Vec<Frame<P::State, P::Token>>,
    nfa: InlinedNfa<P::State>,
}

/// Walks `pda` from its start state and inlines every sub-automaton at each point where it is
/// entered. States for which `keep` returns `false` as well as all states operating on the stack
/// are absorbed, start and stop are always kept. The stop state is only reached from the root
/// frame, paths that arrive there with a push pending are dropped.
pub(super) fn inline<P, K>(pda: &P, keep: K) -> Result<InlinedNfa<P::State>, ConversionError>
where
    P: Pda,
    K: Fn(&P::State) -> bool,
{
    check_pops(pda)?;

    let start = pda.start();
    let stop = pda.stop();
    let nfa = InlinedNfa::new(start.clone(), stop.clone());

    let mut root = Frame::root();
    root.memo.insert(start.clone(), InlinedNfa::<P::State>::START);
    root.memo.insert(stop.clone(), InlinedNfa::<P::State>::STOP);

    let mut inliner = Inliner {
        pda,
        keep,
        start: start.clone(),
        stop,
        frames: vec![root],
        nfa,
    };

    let followers = pda.followers(&start).collect::<Vec<_>>();
    let visiting = followers.iter().map(|f| (f.clone(), ROOT)).collect::<Visiting<_>>();
    for follower in followers {
        inliner.process(follower, ROOT, InlinedNfa::<P::State>::START, &visiting)?;
    }

    // a frame without any pop of its token can only be left through the stop state
    if let Some((state, token)) = inliner
        .frames
        .iter()
        .filter(|frame| frame.pops.is_empty())
        .find_map(|frame| frame.push.as_ref())
    {
        return Err(ConversionError::UnbalancedPush {
            state: format!("{state:?}"),
            token: format!("{token:?}"),
        });
    }

    debug!(
        "inlined PDA into {} states using {} stack frames",
        inliner.nfa.size(),
        inliner.frames.len()
    );
    Ok(inliner.nfa)
}

/// Ensures that every token popped by a state reachable from the start is pushed by some
/// reachable state. A pop that does not match the pending push during traversal is then just a
/// path the stack does not permit and is abandoned.
fn check_pops<P: Pda>(pda: &P) -> Result<(), ConversionError> {
    let mut seen = Set::default();
    let mut stack = vec![pda.start()];
    let mut pushes = vec![];
    let mut pops = vec![];
    while let Some(q) = stack.pop() {
        if !seen.insert(q.clone()) {
            continue;
        }
        if let Some(token) = pda.push(&q) {
            pushes.push(token);
        } else if let Some(token) = pda.pop(&q) {
            pops.push((q.clone(), token));
        }
        let followers = pda.followers(&q).collect::<Vec<_>>();
        stack.extend(followers.into_iter().rev());
    }

    match pops.into_iter().find(|(_, token)| !pushes.contains(token)) {
        Some((state, token)) => Err(ConversionError::UnbalancedPop {
            state: format!("{state:?}"),
            token: format!("{token:?}"),
        }),
        None => Ok(()),
    }
}

impl<'a, P, K> Inliner<'a, P, K>
where
    P: Pda,
    K: Fn(&P::State) -> bool,
{
    fn process(
        &mut self,
        state: P::State,
        frame: FrameId,
        receiver: NodeId,
        visiting: &Visiting<P::State>,
    ) -> Result<(), ConversionError> {
        if let Some(token) = self.pda.push(&state) {
            let entered = self.enter(&state, frame, token)?;
            return self.pass_through(&state, entered, receiver, visiting);
        }
        if let Some(token) = self.pda.pop(&state) {
            return self.leave(state, frame, token, receiver, visiting);
        }
        if state == self.stop && frame != ROOT {
            trace!("abandoning path to {state:?}, frame {frame} is still pending");
            return Ok(());
        }
        if state != self.start && state != self.stop && !(self.keep)(&state) {
            return self.pass_through(&state, frame, receiver, visiting);
        }
        self.materialize(state, frame, receiver)
    }

    /// Explores the followers of an absorbed state, connecting whatever is kept to `receiver`.
    fn pass_through(
        &mut self,
        state: &P::State,
        frame: FrameId,
        receiver: NodeId,
        visiting: &Visiting<P::State>,
    ) -> Result<(), ConversionError> {
        let followers = self.pda.followers(state).collect::<Vec<_>>();
        let mut next = visiting.clone();
        next.extend(followers.iter().map(|f| (f.clone(), frame)));
        for follower in followers {
            if !visiting.contains(&(follower.clone(), frame)) {
                self.process(follower, frame, receiver, &next)?;
            }
        }
        Ok(())
    }

    fn materialize(
        &mut self,
        state: P::State,
        frame: FrameId,
        receiver: NodeId,
    ) -> Result<(), ConversionError> {
        if let Some(&node) = self.frames[frame].memo.get(&state) {
            self.nfa.add_edge(receiver, node);
            return Ok(());
        }

        let node = self.nfa.add_node(state.clone());
        self.frames[frame].memo.insert(state.clone(), node);
        trace!("created state {node} for {state:?} in frame {frame}");

        let followers = self.pda.followers(&state).collect::<Vec<_>>();
        let visiting = followers.iter().map(|f| (f.clone(), frame)).collect::<Visiting<_>>();
        for follower in followers {
            self.process(follower, frame, node, &visiting)?;
        }
        self.nfa.add_edge(receiver, node);
        Ok(())
    }

    /// Returns the frame in which a push of `token` from within `frame` continues. Usually this is
    /// a fresh frame, but if `token` is already pending somewhere on the stack, the push is
    /// recursive and the existing frame is reused with `frame` as an additional return target.
    fn enter(
        &mut self,
        state: &P::State,
        frame: FrameId,
        token: P::Token,
    ) -> Result<FrameId, ConversionError> {
        let Some(open) = self.find_open(frame, &token) else {
            self.frames.push(Frame::opened(state.clone(), token, frame));
            return Ok(self.frames.len() - 1);
        };

        if !self.frames[open].returns.contains(&frame) {
            trace!("folding recursive push of {token:?} in frame {frame} into frame {open}");
            self.frames[open].returns.push(frame);
            let sites = self.frames[open].pops.clone();
            for site in sites {
                self.pass_through(&site.state, frame, site.receiver, &site.visiting)?;
            }
        }
        Ok(open)
    }

    fn leave(
        &mut self,
        state: P::State,
        frame: FrameId,
        token: P::Token,
        receiver: NodeId,
        visiting: &Visiting<P::State>,
    ) -> Result<(), ConversionError> {
        let Some(pending) = self.frames[frame].token() else {
            trace!("abandoning pop of {token:?} in {state:?}, no push is pending");
            return Ok(());
        };
        if pending != &token {
            trace!("abandoning pop of {token:?} in {state:?}, pending is {pending:?}");
            return Ok(());
        }

        self.frames[frame].pops.push(PopSite {
            state: state.clone(),
            receiver,
            visiting: visiting.clone(),
        });
        let returns = self.frames[frame].returns.clone();
        for target in returns {
            self.pass_through(&state, target, receiver, visiting)?;
        }
        Ok(())
    }

    fn find_open(&self, frame: FrameId, token: &P::Token) -> Option<FrameId> {
        let mut current = Some(frame);
        while let Some(id) = current {
            if self.frames[id].token() == Some(token) {
                return Some(id);
            }
            current = self.frames[id].parent;
        }
        None
    }
}
