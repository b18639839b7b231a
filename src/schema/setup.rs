use crate::error::AppError;
use crate::schema::mappings::{index_body, mappings, MappingMode};
use crate::search::client::SearchEngine;

/// What [`ensure_index`] did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    Created,
    Recreated,
    MappingUpdated,
}

/// Make sure `index` exists with the story mapping.
///
/// An existing index gets its mapping updated in place, unless
/// `force_recreate` is set, in which case it is dropped (with its documents)
/// and created again.
pub async fn ensure_index(
    engine: &dyn SearchEngine,
    index: &str,
    mode: MappingMode,
    force_recreate: bool,
) -> Result<SetupOutcome, AppError> {
    if !engine.index_exists(index).await? {
        tracing::info!("Creating index '{index}' with {mode} mappings");
        engine.create_index(index, &index_body(mode)).await?;
        return Ok(SetupOutcome::Created);
    }

    if force_recreate {
        tracing::warn!("Force recreate requested, deleting index '{index}'");
        engine.delete_index(index).await?;
        engine.create_index(index, &index_body(mode)).await?;
        return Ok(SetupOutcome::Recreated);
    }

    tracing::info!("Updating mappings of existing index '{index}'");
    engine
        .put_mapping(index, &mappings(mode))
        .await
        .map_err(|e| {
            tracing::warn!(
                "Mapping update failed; incompatible changes need a forced recreate: {e}"
            );
            e
        })?;
    Ok(SetupOutcome::MappingUpdated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineErrorKind;
    use crate::search::client::MockSearchEngine;

    #[tokio::test]
    async fn test_creates_missing_index() {
        let mut engine = MockSearchEngine::new();
        engine.expect_index_exists().times(1).returning(|_| Ok(false));
        engine.expect_create_index().times(1).returning(|index, body| {
            assert_eq!(index, "stories");
            assert_eq!(body["mappings"]["dynamic"], "strict");
            Ok(())
        });

        let outcome = ensure_index(&engine, "stories", MappingMode::Strict, false)
            .await
            .unwrap();
        assert_eq!(outcome, SetupOutcome::Created);
    }

    #[tokio::test]
    async fn test_updates_mapping_of_existing_index() {
        let mut engine = MockSearchEngine::new();
        engine.expect_index_exists().times(1).returning(|_| Ok(true));
        engine.expect_put_mapping().times(1).returning(|_, mapping| {
            assert_eq!(mapping["dynamic"], false);
            Ok(())
        });

        let outcome = ensure_index(&engine, "stories", MappingMode::Loose, false)
            .await
            .unwrap();
        assert_eq!(outcome, SetupOutcome::MappingUpdated);
    }

    #[tokio::test]
    async fn test_force_recreate_drops_existing_index() {
        let mut seq = mockall::Sequence::new();
        let mut engine = MockSearchEngine::new();
        engine
            .expect_index_exists()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));
        engine
            .expect_delete_index()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        engine
            .expect_create_index()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let outcome = ensure_index(&engine, "stories", MappingMode::Strict, true)
            .await
            .unwrap();
        assert_eq!(outcome, SetupOutcome::Recreated);
    }

    #[tokio::test]
    async fn test_incompatible_mapping_update_fails() {
        let mut engine = MockSearchEngine::new();
        engine.expect_index_exists().times(1).returning(|_| Ok(true));
        engine.expect_put_mapping().times(1).returning(|_, _| {
            Err(AppError::SearchEngine {
                kind: EngineErrorKind::Rejected,
                message: "mapper [type] cannot be changed".into(),
                reason: Some("illegal_argument_exception".into()),
            })
        });

        let result = ensure_index(&engine, "stories", MappingMode::Strict, false).await;
        assert!(matches!(result, Err(AppError::SearchEngine { .. })));
    }
}
