//! Optik Engine crate - gesture recognition and motion control.
//!
//! Per frame, strictly in order: [`normalizer`] turns raw landmarks into a
//! feature vector, [`classifier`] commits a gesture with dwell and
//! hysteresis, [`smoother`] produces a filtered, edge-boosted cursor position
//! and [`dispatcher`] turns transitions into intents. [`engine`] wires the
//! four together; [`controller`] applies the intents to the OS collaborators.

pub mod classifier;
pub mod controller;
pub mod dispatcher;
pub mod engine;
pub mod handoff;
pub mod health;
pub mod normalizer;
pub mod smoother;
pub mod source;
pub mod synthetic;

pub use classifier::GestureClassifier;
pub use controller::{Controller, FrameReport};
pub use dispatcher::{ActionDispatcher, DispatcherState};
pub use engine::{EngineOutput, GestureEngine};
pub use handoff::{frame_slot, FrameConsumer, FrameProducer, SequencedFrame};
pub use health::{Alert, Collaborator, CollaboratorHealth};
pub use normalizer::{FeatureVector, LandmarkNormalizer};
pub use smoother::{ActiveRegion, CursorState, MotionSmoother};
pub use source::{write_detection, LandmarkSource, MemorySource, ReplaySource};
pub use synthetic::{Finger, SyntheticHand};
