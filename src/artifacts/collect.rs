//! Ready-made listeners and visitors for consumers of artifact sets.

use std::path::PathBuf;

use super::{ArtifactVisitor, AsyncArtifactListener, LocalArtifactVisitor};
use crate::error::ArtifactFailure;
use crate::{ResolvedArtifact, VisitSource, VisitType};

/// Wants the contents of every set; ignores streamed artifacts (they are collected at replay).
#[derive(Clone, Copy, Debug, Default)]
pub struct VisitAll;

impl AsyncArtifactListener for VisitAll {
    fn prepare_for_visit(&mut self, _: &VisitSource) -> VisitType {
        VisitType::Visit
    }

    fn artifact_available(&mut self, _: &ResolvedArtifact) {}
}

/// Only needs build-dependency information: declines contents, so no transform work is scheduled.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildDependenciesOnly;

impl AsyncArtifactListener for BuildDependenciesOnly {
    fn prepare_for_visit(&mut self, _: &VisitSource) -> VisitType {
        VisitType::NoContents
    }

    fn artifact_available(&mut self, _: &ResolvedArtifact) {}
}

/// One replayed event, in order.
#[derive(Clone, Debug)]
pub enum VisitEvent {
    Artifact(ResolvedArtifact),
    Failure(ArtifactFailure),
    EndOfCollection(VisitSource),
}

/// Records everything a completion replays.
#[derive(Debug, Default)]
pub struct ArtifactCollector {
    pub events: Vec<VisitEvent>,
}

impl ArtifactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &ResolvedArtifact> {
        self.events.iter().filter_map(|e| match e {
            VisitEvent::Artifact(a) => Some(a),
            _ => None,
        })
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.artifacts().map(|a| a.file.clone()).collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ArtifactFailure> {
        self.events.iter().filter_map(|e| match e {
            VisitEvent::Failure(f) => Some(f),
            _ => None,
        })
    }
}

impl ArtifactVisitor for ArtifactCollector {
    fn visit_artifact(&mut self, artifact: &ResolvedArtifact) {
        self.events.push(VisitEvent::Artifact(artifact.clone()));
    }

    fn visit_failure(&mut self, failure: &ArtifactFailure) {
        self.events.push(VisitEvent::Failure(failure.clone()));
    }

    fn end_visit_collection(&mut self, source: &VisitSource) {
        self.events.push(VisitEvent::EndOfCollection(source.clone()));
    }
}

impl LocalArtifactVisitor for Vec<ResolvedArtifact> {
    fn visit_local_artifact(&mut self, artifact: &ResolvedArtifact) {
        self.push(artifact.clone());
    }
}
