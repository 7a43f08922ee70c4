pub mod model_loader;
pub mod onnx_classifier;
