use super::error::EngineError;
use super::{DocumentMapping, EngineFactory, IndexEngine};
use crate::config::EngineConfig;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, STORED, STRING, Schema, TEXT, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

const ID_FIELD: &str = "_id";
const BODY_FIELD: &str = "body";
const SOURCE_FIELD: &str = "_source";

/// Creates tantivy indexes with a schemaless default mapping: one tokenized body field.
#[derive(Debug, Clone)]
pub struct TantivyFactory {
    writer_heap_bytes: usize,
    search_limit: usize,
}

impl TantivyFactory {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            writer_heap_bytes: config.writer_heap_bytes,
            search_limit: config.search_limit.max(1),
        }
    }
}

impl EngineFactory for TantivyFactory {
    fn create(
        &self,
        path: &Path,
        mapping: &DocumentMapping,
    ) -> Result<Box<dyn IndexEngine>, EngineError> {
        let engine =
            TantivyEngine::create(path, mapping, self.writer_heap_bytes, self.search_limit)?;
        Ok(Box::new(engine))
    }
}

#[derive(Debug, Clone, Copy)]
struct Fields {
    id: Field,
    body: Field,
    source: Option<Field>,
}

/// An open tantivy index.
///
/// Every mutation is committed and the reader reloaded before returning, so the
/// next command observes it. Segment merges run on tantivy's own threads.
pub struct TantivyEngine {
    writer: IndexWriter,
    reader: IndexReader,
    parser: QueryParser,
    fields: Fields,
    search_limit: usize,
}

impl TantivyEngine {
    pub fn create(
        path: &Path,
        mapping: &DocumentMapping,
        writer_heap_bytes: usize,
        search_limit: usize,
    ) -> Result<Self, EngineError> {
        let mut schema_builder = Schema::builder();
        let id = schema_builder.add_text_field(ID_FIELD, STRING | STORED);
        let body = schema_builder.add_text_field(BODY_FIELD, TEXT);
        let source = mapping
            .store_source
            .then(|| schema_builder.add_text_field(SOURCE_FIELD, STORED));
        let schema = schema_builder.build();

        let index = Index::create_in_dir(path, schema)?;
        let writer: IndexWriter = index.writer_with_num_threads(1, writer_heap_bytes)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let parser = QueryParser::for_index(&index, vec![body]);

        Ok(Self {
            writer,
            reader,
            parser,
            fields: Fields { id, body, source },
            search_limit,
        })
    }

    fn id_term(&self, id: &str) -> Term {
        Term::from_field_text(self.fields.id, id)
    }

    fn commit(&mut self) -> Result<(), EngineError> {
        self.writer.commit()?;
        self.reader.reload()?;
        Ok(())
    }
}

impl IndexEngine for TantivyEngine {
    fn index(&mut self, id: &str, doc: &str) -> Result<(), EngineError> {
        let mut document = TantivyDocument::default();
        document.add_text(self.fields.id, id);
        document.add_text(self.fields.body, doc);
        if let Some(source) = self.fields.source {
            document.add_text(source, doc);
        }

        self.writer.delete_term(self.id_term(id));
        self.writer.add_document(document)?;
        self.commit()
    }

    fn delete(&mut self, id: &str) -> Result<(), EngineError> {
        self.writer.delete_term(self.id_term(id));
        self.commit()
    }

    fn search(&self, query: &str) -> Result<Vec<String>, EngineError> {
        let query = self.parser.parse_query(query)?;
        let searcher = self.reader.searcher();
        let hits = searcher.search(&query, &TopDocs::with_limit(self.search_limit))?;

        let mut ids = Vec::with_capacity(hits.len());
        for (_score, address) in hits {
            let document: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = document.get_first(self.fields.id).and_then(|v| v.as_str()) {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    fn doc_count(&self) -> Result<u64, EngineError> {
        Ok(self.reader.searcher().num_docs())
    }

    fn get_stored(&self, id: &str) -> Result<Option<Vec<u8>>, EngineError> {
        let Some(source) = self.fields.source else {
            return Ok(None);
        };

        let searcher = self.reader.searcher();
        let query = TermQuery::new(self.id_term(id), IndexRecordOption::Basic);
        let Some((_score, address)) = searcher
            .search(&query, &TopDocs::with_limit(1))?
            .into_iter()
            .next()
        else {
            return Ok(None);
        };

        let document: TantivyDocument = searcher.doc(address)?;
        Ok(document
            .get_first(source)
            .and_then(|v| v.as_str())
            .map(|s| s.as_bytes().to_vec()))
    }

    fn close(self: Box<Self>) -> Result<(), EngineError> {
        let TantivyEngine { writer, .. } = *self;
        writer.wait_merging_threads()?;
        Ok(())
    }
}
