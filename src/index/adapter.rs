use anyhow::{Context, Result};
use arrow_array::{
    types::Float32Type, Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatch,
    RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::sync::Arc;

use crate::core::model::{FlatMetadata, MetadataValue, Record, ScoredRecord};
use crate::index::filter::FilterPredicate;

const TABLE_NAME: &str = "records";

/// The subset of recognized metadata fields promoted to real Arrow columns
/// so they're usable in a LanceDB `.only_if(...)` pushdown filter (§4.9).
/// Everything else in a record's flat metadata still round-trips through
/// `metadata_json`.
const FILTERABLE_STRING_FIELDS: &[&str] = &["file_type", "processing_method", "source"];
const FILTERABLE_INT_FIELDS: &[&str] = &[
    "structural_info_tables_count",
    "structural_info_titles_count",
];

/// LanceDB-backed vector index. Generalizes the teacher's fixed
/// `research_history` table to a generic flat-metadata records table:
/// `id`, `text`, `vector`, a handful of promoted filterable columns, and a
/// `metadata_json` catch-all carrying the complete flattened map.
pub struct VectorIndex {
    table: Table,
    embedding_dim: usize,
}

impl VectorIndex {
    pub async fn open(dir: &std::path::Path, embedding_dim: usize) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create vector store dir {}", dir.display()))?;
        let uri = dir.to_string_lossy().to_string();

        let db = lancedb::connect(&uri)
            .execute()
            .await
            .context("failed to connect to LanceDB")?;

        let schema = Arc::new(Self::schema(embedding_dim)?);

        let table = match db.open_table(TABLE_NAME).execute().await {
            Ok(table) => table,
            Err(lancedb::Error::TableNotFound { .. }) => {
                tracing::info!("creating LanceDB table '{}' (dim={})", TABLE_NAME, embedding_dim);
                db.create_empty_table(TABLE_NAME, schema.clone())
                    .execute()
                    .await
                    .context("failed to create LanceDB table")?
            }
            Err(e) => return Err(e).context("failed to open LanceDB table"),
        };

        if let Err(e) = table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
        {
            tracing::debug!("LanceDB create_index skipped/failed: {}", e);
        }

        Ok(Self { table, embedding_dim })
    }

    fn schema(embedding_dim: usize) -> Result<Schema> {
        let vector_len: i32 = embedding_dim.try_into().context("embedding dimension too large")?;
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
        ];
        for name in FILTERABLE_STRING_FIELDS {
            fields.push(Field::new(*name, DataType::Utf8, true));
        }
        for name in FILTERABLE_INT_FIELDS {
            fields.push(Field::new(*name, DataType::Int64, true));
        }
        fields.push(Field::new("metadata_json", DataType::Utf8, false));
        fields.push(Field::new(
            "vector",
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), vector_len),
            true,
        ));
        Ok(Schema::new(fields))
    }

    pub async fn add(&self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let batch = self.records_to_batch(&records)?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema);
        self.table
            .add(batches)
            .execute()
            .await
            .context("failed to add records to LanceDB")?;
        Ok(())
    }

    fn records_to_batch(&self, records: &[Record]) -> Result<RecordBatch> {
        let schema = Arc::new(Self::schema(self.embedding_dim)?);
        let vector_len: i32 = self.embedding_dim.try_into().context("embedding dimension too large")?;

        let ids = StringArray::from(records.iter().map(|r| r.id.clone()).collect::<Vec<_>>());
        let texts = StringArray::from(records.iter().map(|r| r.text.clone()).collect::<Vec<_>>());

        let mut columns: Vec<Arc<dyn Array>> = vec![Arc::new(ids), Arc::new(texts)];

        for name in FILTERABLE_STRING_FIELDS {
            let values: Vec<Option<String>> = records
                .iter()
                .map(|r| r.metadata.get(*name).map(|v| v.to_string()))
                .collect();
            columns.push(Arc::new(StringArray::from(values)));
        }
        for name in FILTERABLE_INT_FIELDS {
            let values: Vec<Option<i64>> = records
                .iter()
                .map(|r| r.metadata.get(*name).and_then(MetadataValue::as_f64).map(|f| f as i64))
                .collect();
            columns.push(Arc::new(Int64Array::from(values)));
        }

        let metadata_json: Vec<String> = records
            .iter()
            .map(|r| serde_json::to_string(&r.metadata).unwrap_or_default())
            .collect();
        columns.push(Arc::new(StringArray::from(metadata_json)));

        let vectors = FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
            records
                .iter()
                .map(|r| Some(r.vector.iter().map(|v| Some(*v)).collect::<Vec<_>>())),
            vector_len,
        );
        columns.push(Arc::new(vectors));

        RecordBatch::try_new(schema, columns).context("failed to build Arrow RecordBatch")
    }

    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: &FilterPredicate,
    ) -> Result<Vec<ScoredRecord>> {
        let mut query = self
            .table
            .query()
            .nearest_to(query_vector)
            .context("failed to build vector query")?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(limit);

        if let Some(rendered) = filter.render() {
            query = query.only_if(rendered);
        }

        let stream = query.execute().await.context("failed to search LanceDB")?;
        let batches: Vec<RecordBatch> = stream.try_collect().await.context("failed to read search results")?;

        let mut out = Vec::new();
        for batch in &batches {
            out.extend(Self::batch_to_scored_records(batch)?);
        }
        out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        Ok(out)
    }

    /// Total record count and basic aggregate stats, used by `stats_index`/
    /// `stats_knowledge_base`.
    pub async fn scan_all(&self) -> Result<Vec<ScoredRecord>> {
        let stream = self.table.query().execute().await.context("failed to scan LanceDB")?;
        let batches: Vec<RecordBatch> = stream.try_collect().await.context("failed to read scan results")?;
        let mut out = Vec::new();
        for batch in &batches {
            out.extend(Self::batch_to_scored_records(batch)?);
        }
        Ok(out)
    }

    pub async fn count(&self) -> Result<usize> {
        self.table.count_rows(None).await.context("failed to count rows")
    }

    /// Backend collection name, surfaced by `stats_index`.
    pub fn collection_name(&self) -> &'static str {
        TABLE_NAME
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// Best-effort index rebuild/compaction. LanceDB's `create_index` is
    /// itself idempotent and safe to re-run; failures are logged, not fatal,
    /// matching the teacher's "safe to ignore failures; flat search still
    /// works" policy for this same call in `history.rs`.
    pub async fn optimize(&self) -> Result<()> {
        self.table
            .create_index(&["vector"], lancedb::index::Index::Auto)
            .execute()
            .await
            .context("failed to rebuild vector index")
    }

    fn batch_to_scored_records(batch: &RecordBatch) -> Result<Vec<ScoredRecord>> {
        let text_col = batch
            .column_by_name("text")
            .context("missing column: text")?
            .as_any()
            .downcast_ref::<StringArray>()
            .context("invalid type for column: text")?;
        let metadata_col = batch
            .column_by_name("metadata_json")
            .context("missing column: metadata_json")?
            .as_any()
            .downcast_ref::<StringArray>()
            .context("invalid type for column: metadata_json")?;
        let distance_col: Option<&Float32Array> = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

        let mut out = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let metadata: FlatMetadata = serde_json::from_str(metadata_col.value(row)).unwrap_or_default();
            let score = distance_col
                .map(|c| (1.0 - c.value(row)).clamp(0.0, 1.0))
                .unwrap_or(0.0);
            out.push(ScoredRecord {
                text: text_col.value(row).to_string(),
                metadata,
                score,
            });
        }
        Ok(out)
    }
}
