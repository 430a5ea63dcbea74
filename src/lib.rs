//! Workspace-level integration tests for tapelease live in `tests/`.
