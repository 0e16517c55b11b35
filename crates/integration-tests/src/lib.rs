//! End-to-end tests for Easel live under `tests/`
