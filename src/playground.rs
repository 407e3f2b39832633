//! Small in-memory pet store documented through [`DocumentedRouter`].
//!
//! Used by the demo server, the document dump binary and the end-to-end tests.

use std::{sync::Arc, time::SystemTime};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{
    error::SwaggerResult,
    operation::{Location, OperationSpec, ResponseSpec, created, no_content, not_found, ok},
    reflect::{Reflect, TypeInfo},
    support::{DocumentedRouter, SwaggerSupport},
};

/// Species of a pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum PetKind {
    Dog,
    Cat,
    Bird,
}

impl Reflect for PetKind {
    fn type_info() -> TypeInfo {
        TypeInfo::enumeration("PetKind", ["dog", "cat", "bird"])
    }
}

/// Person responsible for a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Owner {
    pub name: String,
    pub email: Option<String>,
}

impl Reflect for Owner {
    fn type_info() -> TypeInfo {
        TypeInfo::object("Owner")
            .field::<String>("name")
            .field::<Option<String>>("email")
    }
}

/// A registered pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub kind: PetKind,
    pub tags: Vec<String>,
    pub owner: Option<Owner>,
    /// RFC 3339 timestamp.
    pub registered_at: String,
}

impl Reflect for Pet {
    fn type_info() -> TypeInfo {
        TypeInfo::object("Pet")
            .describe("A pet known to the store")
            .field::<Uuid>("id")
            .field::<String>("name")
            .field::<PetKind>("kind")
            .field::<Vec<String>>("tags")
            .field::<Option<Owner>>("owner")
            .described_field::<OffsetDateTime>("registered_at", "Registration time")
    }
}

/// Payload used to register or update a pet.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct PetInput {
    pub name: String,
    pub kind: PetKind,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner: Option<Owner>,
}

impl Reflect for PetInput {
    fn type_info() -> TypeInfo {
        TypeInfo::object("PetInput")
            .field::<String>("name")
            .field::<PetKind>("kind")
            .field::<Option<Vec<String>>>("tags")
            .field::<Option<Owner>>("owner")
    }
}

/// Collection location.
pub struct Pets;

impl Reflect for Pets {
    fn type_info() -> TypeInfo {
        TypeInfo::object("Pets")
    }
}

impl Location for Pets {
    const PATH: &'static str = "/pets";
    const TAGS: &'static [&'static str] = &["pets"];
}

/// Single pet location.
pub struct PetById;

impl Reflect for PetById {
    fn type_info() -> TypeInfo {
        TypeInfo::object("PetById").described_field::<Uuid>("id", "Identifier of the pet")
    }
}

impl Location for PetById {
    const PATH: &'static str = "/pets/{id}";
    const TAGS: &'static [&'static str] = &["pets"];
}

/// Store statistics location.
pub struct Stats;

impl Reflect for Stats {
    fn type_info() -> TypeInfo {
        TypeInfo::object("Stats")
    }
}

impl Location for Stats {
    const PATH: &'static str = "/stats";
    const TAGS: &'static [&'static str] = &["stats"];
}

/// Extra query parameters of the listing.
#[derive(Debug, Default, Deserialize)]
#[allow(missing_docs)]
pub struct PetFilter {
    pub kind: Option<PetKind>,
    pub limit: Option<usize>,
}

impl Reflect for PetFilter {
    fn type_info() -> TypeInfo {
        TypeInfo::object("PetFilter")
            .field::<Option<PetKind>>("kind")
            .described_field::<Option<u32>>("limit", "Maximum number of pets returned")
    }
}

/// Headers accepted by the listing.
pub struct ClientHeaders;

impl Reflect for ClientHeaders {
    fn type_info() -> TypeInfo {
        TypeInfo::object("ClientHeaders")
            .described_field::<Option<String>>("X-Request-Id", "Correlation identifier")
    }
}

/// In-memory pet storage shared by the handlers.
#[derive(Clone, Default)]
pub struct PetStore {
    pets: Arc<DashMap<Uuid, Pet>>,
}

impl PetStore {
    /// Number of stored pets.
    pub fn len(&self) -> usize {
        self.pets.len()
    }

    /// Whether no pet is stored.
    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
    }
}

/// Document and mount the pet store routes, plus the documentation routes.
pub fn router(support: SwaggerSupport) -> SwaggerResult<Router> {
    let router = DocumentedRouter::<PetStore>::new(support)
        .get::<Pets, _, _>(
            OperationSpec::responds("List pets", [ok::<Vec<Pet>>()])
                .parameter::<PetFilter>()
                .header::<ClientHeaders>(),
            list_pets,
        )?
        .post::<Pets, PetInput, _, _>(
            OperationSpec::responds("Register a pet", [created::<Pet>()]),
            create_pet,
        )?
        .get::<PetById, _, _>(
            OperationSpec::responds("Find a pet", [ok::<Pet>(), not_found()]),
            get_pet,
        )?
        .put::<PetById, PetInput, _, _>(
            OperationSpec::responds("Replace a pet", [ok::<Pet>(), not_found()]),
            update_pet,
        )?
        .delete::<PetById, _, _>(
            OperationSpec::responds("Remove a pet", [no_content(), not_found()]),
            delete_pet,
        )?
        .get::<Stats, _, _>(
            OperationSpec::responds(
                "Pet counts per kind",
                [(StatusCode::OK, ResponseSpec::explicit("KindCounts", kind_counts_schema()))],
            ),
            stats,
        )?
        .into_router()
        .with_state(PetStore::default());

    Ok(router)
}

fn kind_counts_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": { "type": "integer", "format": "int64" }
    })
}

async fn list_pets(
    State(store): State<PetStore>,
    Query(filter): Query<PetFilter>,
) -> Json<Vec<Pet>> {
    let mut pets: Vec<Pet> = store
        .pets
        .iter()
        .filter(|pet| filter.kind.is_none_or(|kind| pet.kind == kind))
        .map(|pet| pet.value().clone())
        .collect();
    pets.sort_by(|a, b| a.name.cmp(&b.name));
    if let Some(limit) = filter.limit {
        pets.truncate(limit);
    }
    Json(pets)
}

async fn create_pet(
    State(store): State<PetStore>,
    Json(input): Json<PetInput>,
) -> (StatusCode, Json<Pet>) {
    let pet = Pet {
        id: Uuid::new_v4(),
        name: input.name,
        kind: input.kind,
        tags: input.tags,
        owner: input.owner,
        registered_at: format_system_time(SystemTime::now()),
    };
    store.pets.insert(pet.id, pet.clone());
    (StatusCode::CREATED, Json(pet))
}

async fn get_pet(
    State(store): State<PetStore>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pet>, StatusCode> {
    store
        .pets
        .get(&id)
        .map(|pet| Json(pet.value().clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update_pet(
    State(store): State<PetStore>,
    Path(id): Path<Uuid>,
    Json(input): Json<PetInput>,
) -> Result<Json<Pet>, StatusCode> {
    let mut pet = store.pets.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    pet.name = input.name;
    pet.kind = input.kind;
    pet.tags = input.tags;
    pet.owner = input.owner;
    Ok(Json(pet.value().clone()))
}

async fn delete_pet(State(store): State<PetStore>, Path(id): Path<Uuid>) -> StatusCode {
    match store.pets.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn stats(State(store): State<PetStore>) -> Json<Value> {
    let mut counts = serde_json::Map::new();
    for kind in [PetKind::Dog, PetKind::Cat, PetKind::Bird] {
        let count = store.pets.iter().filter(|pet| pet.kind == kind).count();
        if let Ok(Value::String(name)) = serde_json::to_value(kind) {
            counts.insert(name, json!(count));
        }
    }
    Json(Value::Object(counts))
}

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
