//! Live rig: session, frame pump and retargeters under one lifecycle.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::io::protocol::{DataStreamClient, QueryStatus};
use crate::io::session::StreamSession;
use crate::retarget::{
    RetargetError, RetargetOptions, RetargetReport, RigidBodyRetargeter, SubjectRetargeter,
};
use crate::scene::SceneGraph;
use crate::threads::Acquirer;

/// Outcome of one [`LiveRig::tick`].
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Retimed update status; `None` for background acquisition.
    pub update: Option<QueryStatus>,
    pub connected: bool,
    pub report: RetargetReport,
    /// Targets skipped because of configuration errors.
    pub errors: Vec<RetargetError>,
}

/// Streams one session onto a scene.
///
/// ```ignore
/// let mut rig = LiveRig::new(session, options, Duration::ZERO);
/// rig.add_subject("Arm", Some(rig_root));
/// rig.start()?;
/// loop {
///     let outcome = rig.tick(&mut scene);
/// }
/// ```
pub struct LiveRig<C: DataStreamClient + 'static, N> {
    session: Arc<StreamSession<C>>,
    acquirer: Option<Acquirer<C>>,
    poll_interval: Duration,
    options: RetargetOptions,
    subjects: Vec<(SubjectRetargeter<N>, Option<N>)>,
    rigid_bodies: Vec<(RigidBodyRetargeter<N>, Option<N>)>,
}

impl<C, N> LiveRig<C, N>
where
    C: DataStreamClient + 'static,
    N: Copy + Eq + std::hash::Hash,
{
    pub fn new(session: Arc<StreamSession<C>>, options: RetargetOptions, poll_interval: Duration) -> Self {
        Self {
            session,
            acquirer: None,
            poll_interval,
            options,
            subjects: Vec::new(),
            rigid_bodies: Vec::new(),
        }
    }

    /// Drive `subject` onto the skeleton found below `root`.
    pub fn add_subject(&mut self, subject: &str, root: Option<N>) {
        self.subjects
            .push((SubjectRetargeter::new(subject, self.options), root));
    }

    /// Drive `node` from the root segment of `subject`.
    pub fn add_rigid_body(&mut self, subject: &str, node: Option<N>) {
        self.rigid_bodies
            .push((RigidBodyRetargeter::new(subject, self.options), node));
    }

    pub fn session(&self) -> &Arc<StreamSession<C>> {
        &self.session
    }

    pub fn acquirer(&self) -> Option<&Acquirer<C>> {
        self.acquirer.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.acquirer.is_some()
    }

    /// Start connecting and acquiring. No-op if already started.
    pub fn start(&mut self) -> io::Result<()> {
        if self.acquirer.is_none() {
            self.acquirer = Some(Acquirer::start(Arc::clone(&self.session), self.poll_interval)?);
        }
        Ok(())
    }

    /// One consumer update: pump (retimed only), then retarget every target.
    pub fn tick<G: SceneGraph<Node = N>>(&mut self, scene: &mut G) -> TickOutcome {
        let mut outcome = TickOutcome {
            update: self.acquirer.as_ref().and_then(|a| a.on_update()),
            connected: self.session.is_connected(),
            ..TickOutcome::default()
        };
        if !outcome.connected {
            return outcome;
        }

        // Every target in this pass reads the same frame
        let _frame = self.session.hold_frame();

        for (retargeter, root) in &mut self.subjects {
            match retargeter.retarget(&self.session, scene, *root) {
                Ok(report) => outcome.report.merge(&report),
                Err(e) => outcome.errors.push(e),
            }
        }
        for (retargeter, node) in &mut self.rigid_bodies {
            match retargeter.retarget(&self.session, scene, *node) {
                Ok(report) => outcome.report.merge(&report),
                Err(e) => outcome.errors.push(e),
            }
        }
        outcome
    }

    /// Rebuild every subject's node mapping on the next tick.
    ///
    /// Call after adding nodes below a subject root.
    pub fn invalidate_mappings(&mut self) {
        for (retargeter, _) in &mut self.subjects {
            retargeter.invalidate_mapping();
        }
    }

    /// Stop acquiring, join, disconnect, then start again.
    pub fn reconnect(&mut self) -> io::Result<()> {
        log::info!("Reconnecting");
        self.stop_and_disconnect();
        self.start()
    }

    /// Stop acquiring and disconnect.
    pub fn shutdown(&mut self) {
        if self.acquirer.is_some() {
            self.stop_and_disconnect();
            log::info!("Rig shut down");
        }
    }

    fn stop_and_disconnect(&mut self) {
        if let Some(mut acquirer) = self.acquirer.take() {
            acquirer.stop();
        }
        self.session.disconnect();
    }
}

impl<C: DataStreamClient + 'static, N> Drop for LiveRig<C, N> {
    fn drop(&mut self) {
        if let Some(mut acquirer) = self.acquirer.take() {
            acquirer.stop();
            self.session.disconnect();
        }
    }
}
