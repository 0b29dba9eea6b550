pub mod classification_session;
pub mod classify_faces_use_case;
pub mod model_gate;
pub mod output_surface;
