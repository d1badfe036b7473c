//! Language Server
//!
//! The tower-lsp shell around the core: document lifecycle, workspace
//! indexing on startup, and the definition/hover/references handlers. The
//! index sits behind a read-write lock: the document pass is the only
//! writer, queries take read snapshots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::RwLock;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use walkdir::WalkDir;

use crate::capabilities;
use crate::config::PhpFastLspConfig;
use crate::indexer::{index_document, IndexTier, ProjectIndex};
use crate::parser::PhpDocument;

pub struct PhpLanguageServer {
    client: Client,
    config: RwLock<PhpFastLspConfig>,
    root: RwLock<Option<PathBuf>>,
    documents: RwLock<HashMap<Url, PhpDocument>>,
    index: RwLock<ProjectIndex>,
}

impl PhpLanguageServer {
    pub fn new(client: Client) -> Self {
        PhpLanguageServer {
            client,
            config: RwLock::new(PhpFastLspConfig::default()),
            root: RwLock::new(None),
            documents: RwLock::new(HashMap::new()),
            index: RwLock::new(ProjectIndex::new()),
        }
    }

    /// Parses and indexes one document, replacing any previous revision.
    fn open_document(&self, uri: Url, content: String, version: i32) {
        let document = PhpDocument::new(uri.clone(), content, version);
        if !document.errors.is_empty() {
            debug!("{}: {} parse errors (tolerated)", uri, document.errors.len());
        }
        {
            let mut index = self.index.write();
            index_document(&mut index, &document, tier_for(&uri));
        }
        self.documents.write().insert(uri, document);
    }

    /// Walks the workspace root and indexes every `.php` file found.
    fn index_workspace(&self, root: &Path) {
        let config = self.config.read().clone();
        let started = Instant::now();
        let mut files = 0usize;

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !config.exclude_dirs.iter().any(|dir| dir == name.as_ref())
        });
        for entry in walker.flatten() {
            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |ext| ext != "php")
            {
                continue;
            }
            let Ok(uri) = Url::from_file_path(entry.path()) else {
                continue;
            };
            let content = match std::fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(err) => {
                    warn!("skipping {}: {}", entry.path().display(), err);
                    continue;
                }
            };
            let document = PhpDocument::new(uri, content, 0);
            let mut index = self.index.write();
            index_document(&mut index, &document, tier_for(&document.uri));
            files += 1;
        }

        let index = self.index.read();
        info!(
            "indexed {} files ({} project symbols, {} dependency symbols) in {:?}",
            files,
            index.project.definitions_len(),
            index.dependencies.definitions_len(),
            started.elapsed()
        );
    }
}

/// Vendored code goes to the dependencies tier; project code shadows it.
fn tier_for(uri: &Url) -> IndexTier {
    let is_vendored = uri
        .to_file_path()
        .map(|path| path.components().any(|c| c.as_os_str() == "vendor"))
        .unwrap_or(false);
    if is_vendored {
        IndexTier::Dependencies
    } else {
        IndexTier::Project
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for PhpLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        info!("initializing php-fast-lsp");

        if let Some(options) = params.initialization_options {
            match serde_json::from_value(options) {
                Ok(config) => *self.config.write() = config,
                Err(err) => warn!("invalid initializationOptions: {}", err),
            }
        }

        #[allow(deprecated)]
        let fallback_root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path().ok())
            .or(fallback_root);
        *self.root.write() = root;

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                references_provider: Some(OneOf::Left(true)),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "php-fast-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let root = self.root.read().clone();
        let should_index = self.config.read().index_workspace;
        if let (Some(root), true) = (root, should_index) {
            self.index_workspace(&root);
        }
        self.client
            .log_message(MessageType::INFO, "php-fast-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        self.open_document(doc.uri, doc.text, doc.version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.open_document(
            params.text_document.uri,
            change.text,
            params.text_document.version,
        );
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        // Definitions stay in the index; only the open buffer is dropped.
        self.documents.write().remove(&params.text_document.uri);
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>> {
        let position_params = params.text_document_position_params;
        let documents = self.documents.read();
        let Some(document) = documents.get(&position_params.text_document.uri) else {
            return Ok(None);
        };
        let index = self.index.read();
        Ok(
            capabilities::goto_definition(document, &*index, position_params.position)
                .map(GotoDefinitionResponse::Scalar),
        )
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let position_params = params.text_document_position_params;
        let documents = self.documents.read();
        let Some(document) = documents.get(&position_params.text_document.uri) else {
            return Ok(None);
        };
        let index = self.index.read();
        Ok(capabilities::hover(
            document,
            &*index,
            position_params.position,
        ))
    }

    async fn references(&self, params: ReferenceParams) -> LspResult<Option<Vec<Location>>> {
        let position_params = params.text_document_position;
        let documents = self.documents.read();
        let Some(document) = documents.get(&position_params.text_document.uri) else {
            return Ok(None);
        };
        let index = self.index.read();
        let locations = capabilities::find_references(
            document,
            &*index,
            position_params.position,
            params.context.include_declaration,
        );
        Ok(Some(locations))
    }
}
