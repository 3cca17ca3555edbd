// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each:
// training and publishing a model, or classifying a text.
//
// Rules for this layer:
//   - No tensor code here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - Storage is reached only through the registry
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training + publishing workflow
pub mod train_use_case;

// The classification workflow
pub mod predict_use_case;

// Facade combining both for a long-running host
pub mod service;
