pub mod k8s;
pub mod overview;
pub mod views;
