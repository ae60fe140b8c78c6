// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: per-token records from the three input sources,
// a single scoring request, and the seams other layers plug into.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Records read from the tokenomics CSV, time-series CSV and contract JSON
pub mod records;

// Core abstractions (traits) that other layers implement
pub mod traits;
