//! Mocap Retarget - Live motion-capture streaming onto scene hierarchies
//!
//! # Architecture
//!
//! The crate is organized into 6 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  main / bin/                        │  ← Executables
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │              (live rig, skeleton mirror)            │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   retarget/                         │  ← Retargeting
//! │     (name resolution, pose conversion, cache)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌──────────────────────────┐  ┌───────────────────────┐
//! │        threads/          │  │        scene/         │
//! │     (frame pump)         │  │ (graph trait, arena)  │
//! └──────────────────────────┘  └───────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                      io/                            │  ← Infrastructure
//! │    (client protocol, hosts, session, capture)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │            (vectors, quaternions, axes)             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Data Flow
//!
//! ```text
//! capture server ──► DataStreamClient ──► StreamSession ◄── Acquirer (pump)
//!                                              │
//!                                   SubjectRetargeter::retarget
//!                                              │
//!                                     SceneGraph (local nodes)
//! ```

// Layer 1: Core foundation (no internal deps)
pub mod core;

// Layer 2: Client protocol, session and capture files
pub mod io;

// Layer 3: Frame acquisition threads
pub mod threads;

// Layer 3: Scene graph abstraction
pub mod scene;

// Layer 4: Retargeting
pub mod retarget;

// Layer 5: Orchestration
pub mod engine;

pub mod config;
pub mod error;

pub use config::Config;
pub use crate::core::axis::AxisMap;
pub use crate::core::types::{Quaternion, Timestamped, Vec3};
pub use engine::{LiveRig, TickOutcome, mirror_subject};
pub use error::{Error, Result};
pub use io::{
    AcquisitionMode, ClientError, ConnectionState, DataStreamClient, HostList, QueryStatus,
    Reading, SessionOptions, StreamSession,
};
pub use retarget::{RetargetOptions, RetargetReport, RigidBodyRetargeter, SubjectRetargeter};
pub use scene::{Hierarchy, NodeId, SceneGraph};
pub use threads::Acquirer;
