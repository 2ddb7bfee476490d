// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn checkpoint_tag_extracted_for_model_kind() {
    let descriptor = ArtifactDescriptor::new(
        PathBuf::from("/out/checkpoint-100"),
        "checkpoint-100",
        ArtifactKind::Model,
    );
    assert_eq!(descriptor.checkpoint_tag(), Some(100));
}

#[test]
fn checkpoint_tag_absent_for_non_model_kind() {
    let descriptor = ArtifactDescriptor::new(
        PathBuf::from("/out/checkpoint-100"),
        "checkpoint-100",
        ArtifactKind::Directory,
    );
    assert_eq!(descriptor.checkpoint_tag(), None);
}
