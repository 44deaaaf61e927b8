use log::info;
use crate::config::defs::{
    strip_type_version, PipelineError, ACCEPTED_INPUT_TYPES, PAIRED_END_LIBRARY_TYPE, READS_SET_TYPE,
};
use crate::services::Workspace;
use crate::utils::reads::{LibraryHandle, ResolvedInput};


/// Decides whether `reference` names one paired-end library or a reads set,
/// and expands a set into its members.
///
/// # Arguments
///
/// * `workspace` - Object metadata and set membership lookups.
/// * `reference` - The request's `input_reads_ref`.
/// * `combine` - The request's combine flag; required for sets.
///
/// # Returns
/// ResolvedInput with libraries in set order.
pub async fn resolve(
    workspace: &dyn Workspace,
    reference: &str,
    combine: Option<bool>,
) -> Result<ResolvedInput, PipelineError> {
    let info = workspace
        .get_object_info(reference)
        .await
        .map_err(|e| PipelineError::ReferenceResolutionError {
            reference: reference.to_string(),
            error: format!("{:#}", e),
        })?;

    match strip_type_version(&info.type_string) {
        PAIRED_END_LIBRARY_TYPE => {
            info!("Input {} is a paired-end library ({})", reference, info.name);
            Ok(ResolvedInput::SingleLibrary(LibraryHandle::new(reference, info.name)))
        }
        READS_SET_TYPE => {
            let combine = combine.ok_or_else(|| {
                PipelineError::MissingRequiredParameter("combined_assembly_flag".to_string())
            })?;

            let members = workspace
                .get_reads_set(reference)
                .await
                .map_err(|e| PipelineError::ReferenceResolutionError {
                    reference: reference.to_string(),
                    error: format!("{:#}", e),
                })?;
            if members.is_empty() {
                return Err(PipelineError::EmptyReadsSet(reference.to_string()));
            }

            let members: Vec<LibraryHandle> = members
                .into_iter()
                .map(|m| LibraryHandle::new(m.reference, m.name))
                .collect();
            info!(
                "Input {} is a reads set of {} libraries; combined assembly: {}",
                reference,
                members.len(),
                combine
            );
            Ok(ResolvedInput::LibrarySet {
                set: LibraryHandle::new(reference, info.name),
                members,
                combine,
            })
        }
        other => Err(PipelineError::UnsupportedInputType {
            found: other.to_string(),
            accepted: ACCEPTED_INPUT_TYPES.join(", "),
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use crate::services::ObjectInfo;

    struct FakeWorkspace {
        type_string: &'static str,
        members: Vec<ObjectInfo>,
    }

    #[async_trait]
    impl Workspace for FakeWorkspace {
        async fn get_object_info(&self, reference: &str) -> Result<ObjectInfo> {
            if reference == "ws/missing" {
                return Err(anyhow!("object not found"));
            }
            Ok(ObjectInfo {
                reference: reference.to_string(),
                name: "input".to_string(),
                type_string: self.type_string.to_string(),
            })
        }

        async fn get_reads_set(&self, _reference: &str) -> Result<Vec<ObjectInfo>> {
            Ok(self.members.clone())
        }
    }

    fn member(name: &str) -> ObjectInfo {
        ObjectInfo {
            reference: format!("ws/{}", name),
            name: name.to_string(),
            type_string: "KBaseFile.PairedEndLibrary-2.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_single_library_ignores_combine_flag() -> Result<()> {
        let ws = FakeWorkspace { type_string: "KBaseFile.PairedEndLibrary-2.1", members: vec![] };
        let resolved = resolve(&ws, "ws/lib", None).await?;
        assert_eq!(resolved, ResolvedInput::SingleLibrary(LibraryHandle::new("ws/lib", "input")));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_expands_in_order() -> Result<()> {
        let ws = FakeWorkspace {
            type_string: "KBaseSets.ReadsSet-1.0",
            members: vec![member("small_1"), member("small_2")],
        };
        let resolved = resolve(&ws, "ws/set", Some(false)).await?;
        let names: Vec<&str> = resolved.libraries().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["small_1", "small_2"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_requires_combine_flag() {
        let ws = FakeWorkspace { type_string: "KBaseSets.ReadsSet-1.0", members: vec![member("a")] };
        let err = resolve(&ws, "ws/set", None).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingRequiredParameter(ref p) if p == "combined_assembly_flag"));
    }

    #[tokio::test]
    async fn test_empty_set() {
        let ws = FakeWorkspace { type_string: "KBaseSets.ReadsSet-1.0", members: vec![] };
        let err = resolve(&ws, "ws/set", Some(true)).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyReadsSet(_)));
    }

    #[tokio::test]
    async fn test_unsupported_type() {
        let ws = FakeWorkspace { type_string: "KBaseGenomes.Genome-8.2", members: vec![] };
        let err = resolve(&ws, "ws/genome", Some(true)).await.unwrap_err();
        match err {
            PipelineError::UnsupportedInputType { found, accepted } => {
                assert_eq!(found, "KBaseGenomes.Genome");
                assert!(accepted.contains(READS_SET_TYPE));
                assert!(accepted.contains(PAIRED_END_LIBRARY_TYPE));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_failure_wrapped() {
        let ws = FakeWorkspace { type_string: "", members: vec![] };
        let err = resolve(&ws, "ws/missing", None).await.unwrap_err();
        match err {
            PipelineError::ReferenceResolutionError { reference, error } => {
                assert_eq!(reference, "ws/missing");
                assert!(error.contains("object not found"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
