//! Remote workflow-engine deployment backend.
//!
//! Chapters are delegated to pipelines on an external workflow engine; the
//! orchestrator only triggers DAG runs and polls task states through the
//! [`WorkflowEngineApi`] collaborator, translating engine states into the
//! local status model.

pub mod api;
pub mod lifecycle;
pub mod names;
pub mod service;
pub mod stages;
pub mod storage;

pub use api::{ApiError, ApiResult, WorkflowEngineApi};
pub use lifecycle::WorkflowLifecycle;
pub use names::{DAG_ID_PREFIX, dag_name, is_fan_out, task_name};
pub use service::{WorkflowService, aggregate_states, classify_state};
pub use stages::register_airflow_backend;
pub use storage::ObjectStorage;
