//! Workspace-level integration tests for the cartoon pool live in `tests/`.
