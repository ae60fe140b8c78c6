// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Load → preprocess → train → checkpoint
pub mod train_use_case;

// Score one JSON sample from disk
pub mod predict_use_case;

// Serve the trained model over HTTP
pub mod serve_use_case;
