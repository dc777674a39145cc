pub mod annotation_ops;
pub mod status;
pub mod task_ops;
pub mod view;
