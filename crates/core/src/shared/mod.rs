pub mod constants;
pub mod face_region;
pub mod model_resolver;
pub mod onnx_session;
pub mod photo;
