// In-process fake of the Modrinth, Hangar, Fill and file CDN endpoints

#![allow(dead_code)]

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use mcstage::checksum::{HashAlgorithm, compute_hash};
use mcstage::sources::Endpoints;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHUNKY_JAR: &[u8] = b"chunky 1.4.16 jar bytes";
pub const CHUNKY_OLD_JAR: &[u8] = b"chunky 1.4.15 jar bytes";
pub const VIAVERSION_JAR: &[u8] = b"ViaVersion 5.0.3 jar bytes";
pub const VIAVERSION_OLD_JAR: &[u8] = b"ViaVersion 5.0.2 jar bytes";
pub const MYTOOL_JAR: &[u8] = b"mytool custom jar bytes";
pub const PAPER_JAR: &[u8] = b"paper 1.21.4 build 130";

/// How long each file request is held open, so overlapping downloads are observable.
const FILE_DELAY: Duration = Duration::from_millis(20);

pub struct FakeMarket {
    base: String,
    files: HashMap<String, Vec<u8>>,
    downloads: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeMarket {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            modrinth: format!("{}/modrinth", self.base),
            hangar: format!("{}/hangar", self.base),
            paper: format!("{}/paper", self.base),
        }
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{}", self.base, name)
    }

    /// Number of times a file was served.
    pub fn downloads_of(&self, name: &str) -> usize {
        self.downloads
            .lock()
            .unwrap()
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Most file requests that were being served at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn modrinth_file(&self, name: &str, primary: bool) -> Value {
        let data = self.files.get(name).cloned().unwrap_or_default();
        json!({
            "url": self.file_url(name),
            "filename": name,
            "primary": primary,
            "hashes": {
                "sha1": "unused",
                "sha512": compute_hash(&data, HashAlgorithm::Sha512),
            }
        })
    }
}

/// Start the fake on an ephemeral port.
pub async fn start() -> Arc<FakeMarket> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let files: HashMap<String, Vec<u8>> = [
        ("chunky-1.4.16.jar", CHUNKY_JAR),
        ("chunky-1.4.15.jar", CHUNKY_OLD_JAR),
        ("ViaVersion-5.0.3.jar", VIAVERSION_JAR),
        ("ViaVersion-5.0.2.jar", VIAVERSION_OLD_JAR),
        ("mytool.jar", MYTOOL_JAR),
        ("corrupt.jar", b"not what the hash says".as_slice()),
        ("paper-1.21.4-130.jar", PAPER_JAR),
    ]
    .into_iter()
    .map(|(name, data)| (name.to_string(), data.to_vec()))
    .collect();

    let market = Arc::new(FakeMarket {
        base,
        files,
        downloads: Mutex::new(HashMap::new()),
        in_flight: AtomicUsize::new(0),
        peak_in_flight: AtomicUsize::new(0),
    });

    let app = Router::new()
        .route("/modrinth/search", get(modrinth_search))
        .route("/modrinth/project/:id/version", get(modrinth_versions))
        .route("/hangar/projects", get(hangar_search))
        .route("/hangar/projects/:id/latestrelease", get(hangar_latest))
        .route("/hangar/projects/:id/versions/:version", get(hangar_version))
        .route(
            "/paper/v3/projects/:project/versions/:mc/builds/:build",
            get(paper_build),
        )
        .route("/files/:name", get(file))
        .with_state(market.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    market
}

async fn modrinth_versions(
    State(market): State<Arc<FakeMarket>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let versions = match id.as_str() {
        "chunky" => json!([
            {
                "version_number": "1.4.16",
                "files": [market.modrinth_file("chunky-1.4.16.jar", true)]
            },
            {
                "version_number": "1.4.15",
                "files": [market.modrinth_file("chunky-1.4.15.jar", true)]
            }
        ]),
        "noprimary" => json!([
            {
                "version_number": "1.0.0",
                "files": [
                    market.modrinth_file("chunky-1.4.16.jar", false),
                    market.modrinth_file("chunky-1.4.15.jar", false)
                ]
            }
        ]),
        "corrupt" => json!([
            {
                "version_number": "1.0.0",
                "files": [{
                    "url": market.file_url("corrupt.jar"),
                    "primary": true,
                    "hashes": {"sha512": compute_hash(b"something else", HashAlgorithm::Sha512)}
                }]
            }
        ]),
        "empty" => json!([]),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    Ok(Json(versions))
}

async fn modrinth_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!({
        "hits": [
            {"slug": format!("{}-addon", query), "title": "Addon", "description": "x".repeat(100)},
            {"slug": query, "title": "Main", "description": "Pre-generates chunks"}
        ],
        "total_hits": 2
    }))
}

async fn hangar_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("q").cloned().unwrap_or_default();
    Json(json!({
        "pagination": {"limit": 10, "offset": 0, "count": 1},
        "result": [{"name": query.to_uppercase(), "description": "Upper-cased match"}]
    }))
}

async fn hangar_latest(Path(id): Path<String>) -> Result<String, StatusCode> {
    match id.as_str() {
        "ViaVersion" => Ok("5.0.3\n".to_string()),
        "External" => Ok("1.0".to_string()),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn hangar_version(
    State(market): State<Arc<FakeMarket>>,
    Path((id, version)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    match (id.as_str(), version.as_str()) {
        ("ViaVersion", "5.0.3" | "5.0.2") => {
            let name = format!("ViaVersion-{}.jar", version);
            let data = market.files.get(&name).cloned().unwrap_or_default();
            Ok(Json(json!({
                "name": version,
                "downloads": {
                    "PAPER": {
                        "fileInfo": {
                            "name": name,
                            "sizeBytes": data.len(),
                            "sha256Hash": compute_hash(&data, HashAlgorithm::Sha256),
                        },
                        "externalUrl": null,
                        "downloadUrl": market.file_url(&name),
                    }
                }
            })))
        }
        ("External", _) => Ok(Json(json!({
            "name": version,
            "downloads": {
                "PAPER": {
                    "fileInfo": null,
                    "externalUrl": "https://github.com/example/releases",
                    "downloadUrl": null,
                }
            }
        }))),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn paper_build(
    State(market): State<Arc<FakeMarket>>,
    Path((project, mc, build)): Path<(String, String, String)>,
) -> Result<Json<Value>, StatusCode> {
    if project != "paper" || mc != "1.21.4" || !(build == "130" || build == "latest") {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": 130,
        "channel": "STABLE",
        "downloads": {
            "server:default": {
                "name": "paper-1.21.4-130.jar",
                "checksums": {"sha256": compute_hash(PAPER_JAR, HashAlgorithm::Sha256)},
                "size": PAPER_JAR.len(),
                "url": market.file_url("paper-1.21.4-130.jar"),
            }
        }
    })))
}

async fn file(
    State(market): State<Arc<FakeMarket>>,
    Path(name): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    let data = market.files.get(&name).cloned().ok_or(StatusCode::NOT_FOUND)?;
    *market.downloads.lock().unwrap().entry(name).or_default() += 1;

    let current = market.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    market.peak_in_flight.fetch_max(current, Ordering::SeqCst);
    tokio::time::sleep(FILE_DELAY).await;
    market.in_flight.fetch_sub(1, Ordering::SeqCst);

    Ok(data)
}
