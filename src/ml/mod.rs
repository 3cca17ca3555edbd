// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds or evaluates tensors lives here.
//
//   model.rs      — Softmax regression over TF-IDF vectors:
//                   one weight matrix [input_dim, labels] plus
//                   a bias, converted to and from the plain
//                   ModelParameters stored in artifacts
//
//   trainer.rs    — Mini-batch Adam on Autodiff<NdArray> with
//                   per-epoch loss and accuracy
//
//   inferencer.rs — Pins a registry version and runs
//                   tokenizer → features → classifier for one
//                   document
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Linear softmax classifier
pub mod model;

/// Training loop
pub mod trainer;

/// Version-pinned inference engine
pub mod inferencer;
