//! MongoDB command rendering for compiled operations.
//!
//! Pure functions: they turn an [`Operation`] into the filter, projection, update and
//! aggregation documents a MongoDB driver would receive. Nothing here talks to a
//! server; [`explain`] assembles the complete command per method.

use nanoid::nanoid;
use serde_json::{json, Map, Value};

use docql_core::schema::formats;
use docql_core::{
    Dialect, DocqlError, DocqlResult, ErrorCode, Expression, JoinType, PathResolver, PullTarget,
};

use crate::action::{
    ActionDefinition, CreateData, JoinDef, SortEntry, SortOrder, UpdateData, UpdateValue,
};
use crate::adapter::{Method, Operation};

const TEMP_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Variable name for `$lookup` let bindings
pub fn temp_field_name() -> String {
    format!("fld_{}", nanoid!(6, &TEMP_ALPHABET))
}

/// `let` bindings of one lookup; a path is bound once however often it is used
#[derive(Debug, Default)]
struct LetBindings {
    entries: Map<String, Value>,
}

impl LetBindings {
    fn bind(&mut self, path: &str) -> String {
        let source = format!("${}", path);
        if let Some((name, _)) = self
            .entries
            .iter()
            .find(|(_, value)| value.as_str() == Some(source.as_str()))
        {
            return format!("${}", name);
        }
        let name = temp_field_name();
        self.entries.insert(name.clone(), Value::String(source));
        format!("${}", name)
    }
}

/// `{field: 1}` for select, `{field: 0}` for omit
pub fn projection(definition: &ActionDefinition) -> Option<Value> {
    let (fields, flag) = match (&definition.select, &definition.omit) {
        (Some(fields), _) => (fields, 1),
        (None, Some(fields)) => (fields, 0),
        (None, None) => return None,
    };
    Some(Value::Object(
        fields
            .iter()
            .map(|field| (field.clone(), json!(flag)))
            .collect(),
    ))
}

pub fn sort(entries: &[SortEntry]) -> Option<Value> {
    if entries.is_empty() {
        return None;
    }
    Some(Value::Object(
        entries
            .iter()
            .map(|entry| {
                let order = match entry.order {
                    SortOrder::Asc => 1,
                    SortOrder::Desc => -1,
                };
                (entry.field_name.clone(), json!(order))
            })
            .collect(),
    ))
}

/// `{$expr: <where>}`, empty when the action has no condition
pub fn filter(definition: &ActionDefinition) -> Value {
    match definition
        .filter
        .as_ref()
        .and_then(|condition| condition.get_query(Dialect::MongoDb, None))
    {
        Some(query) => json!({ "$expr": query }),
        None => json!({}),
    }
}

/// Merge plain assignments with every other update operator
pub fn update_definition(updates: &UpdateData) -> Value {
    let mut definition = Map::new();
    if !updates.set.is_empty() {
        definition.insert("$set".to_string(), Value::Object(updates.set.clone()));
    }

    for entry in &updates.others {
        let value = match &entry.value {
            UpdateValue::Literal(value) => value.clone(),
            UpdateValue::Condition(condition, target) => condition
                .get_pull_query(Dialect::MongoDb, *target)
                .unwrap_or(Value::Null),
        };
        let slot = definition
            .entry(entry.op.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(fields) = slot {
            fields.insert(entry.field_name.clone(), value);
        }
    }

    Value::Object(definition)
}

pub fn array_filters(filters: &[Expression]) -> Option<Value> {
    if filters.is_empty() {
        return None;
    }
    Some(Value::Array(
        filters
            .iter()
            .filter_map(|condition| {
                condition.get_pull_query(Dialect::MongoDb, PullTarget::Document)
            })
            .collect(),
    ))
}

fn match_id_stage(id: &str) -> Value {
    json!({ "$match": { "_id": formats::encode_object_id(id) } })
}

fn where_stage(definition: &ActionDefinition, pipeline: &mut Vec<Value>) {
    if let Some(query) = definition
        .filter
        .as_ref()
        .and_then(|condition| condition.get_query(Dialect::MongoDb, None))
    {
        pipeline.push(json!({ "$match": { "$expr": query } }));
    }
}

/// Lookup stage of one join; simple lookups read a single record by `_id`
fn lookup(join: &JoinDef, single: bool) -> Value {
    match join.kind {
        JoinType::Complex => {
            let mut bindings = LetBindings::default();
            let condition = match &join.condition {
                Some(condition) => {
                    let mut bind = |path: &str| bindings.bind(path);
                    let resolver: PathResolver<'_> = &mut bind;
                    condition.get_query(Dialect::MongoDb, Some(resolver))
                }
                None => None,
            }
            .unwrap_or(Value::Bool(true));
            json!({ "$lookup": {
                "from": join.from,
                "let": bindings.entries,
                "pipeline": [{ "$match": { "$expr": condition } }],
                "as": join.alias,
            }})
        }
        _ => {
            let temp = temp_field_name();
            let mut stages = vec![json!({ "$match": { "$expr": { "$eq": ["$_id", format!("$${}", temp)] } } })];
            if single {
                stages.push(json!({ "$limit": 1 }));
            }
            json!({ "$lookup": {
                "from": join.from,
                "let": { temp: format!("${}", join.alias) },
                "pipeline": stages,
                "as": join.alias,
            }})
        }
    }
}

fn unwind(join: &JoinDef) -> Value {
    json!({ "$unwind": { "path": format!("${}", join.alias), "preserveNullAndEmptyArrays": true } })
}

/// Joins that a `$match` on joined fields depends on; every join is unwound
pub fn join_stages(joins: &[JoinDef], pipeline: &mut Vec<Value>) {
    for join in joins {
        pipeline.push(lookup(join, false));
        pipeline.push(unwind(join));
    }
}

/// Joins that only shape the output; named joins stay arrays
pub fn lookup_stages(joins: &[JoinDef], pipeline: &mut Vec<Value>) {
    for join in joins {
        pipeline.push(lookup(join, true));
        if join.kind == JoinType::Simple {
            pipeline.push(unwind(join));
        }
    }
}

/// Joins, filter, sort, skip, limit and projection as one aggregation pipeline
fn read_pipeline(definition: &ActionDefinition, limit: Option<u64>) -> Vec<Value> {
    let mut pipeline = Vec::new();
    if definition.filter_needs_joins() {
        join_stages(&definition.joins, &mut pipeline);
        where_stage(definition, &mut pipeline);
    } else {
        where_stage(definition, &mut pipeline);
        lookup_stages(&definition.joins, &mut pipeline);
    }
    if let Some(sort) = sort(&definition.sort) {
        pipeline.push(json!({ "$sort": sort }));
    }
    if let Some(skip) = definition.skip {
        pipeline.push(json!({ "$skip": skip }));
    }
    if let Some(limit) = limit.filter(|limit| *limit > 0) {
        pipeline.push(json!({ "$limit": limit }));
    }
    if let Some(projection) = projection(definition) {
        pipeline.push(json!({ "$project": projection }));
    }
    pipeline
}

/// Pipeline selecting the ids of records matched through joined fields
fn id_pipeline(definition: &ActionDefinition) -> Vec<Value> {
    let mut pipeline = Vec::new();
    join_stages(&definition.joins, &mut pipeline);
    where_stage(definition, &mut pipeline);
    pipeline.push(json!({ "$group": { "_id": "$_id" } }));
    pipeline.push(json!({ "$project": { "_id": 1 } }));
    pipeline
}

fn put(command: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        command.insert(key.to_string(), value);
    }
}

fn require<'a, T>(value: Option<&'a T>, what: &str, method: Method) -> DocqlResult<&'a T> {
    value.ok_or_else(|| {
        DocqlError::client(
            ErrorCode::MissingInputParameter,
            format!("The {} operation needs {}", method, what),
        )
    })
}

/// Full command document for an operation
pub fn explain(op: &Operation) -> DocqlResult<Value> {
    if !op.dialect.is_document() {
        tracing::warn!("No command rendering available for {} databases", op.dialect);
        return Err(DocqlError::Adapter(format!(
            "Command rendering is not available for {} databases",
            op.dialect
        )));
    }

    let definition = &op.definition;
    let collection = Value::String(op.model.clone());
    let mut command = Map::new();
    let read_preference = if definition.use_read_replica {
        "secondaryPreferred"
    } else {
        "primary"
    };

    match op.method {
        Method::CreateOne | Method::CreateMany => {
            let data = require(definition.create_data.as_ref(), "data to create", op.method)?;
            match data {
                CreateData::One(document) => {
                    command.insert("insertOne".into(), collection);
                    command.insert("document".into(), Value::Object(document.clone()));
                }
                CreateData::Many(documents) => {
                    command.insert("insertMany".into(), collection);
                    command.insert(
                        "documents".into(),
                        Value::Array(documents.iter().cloned().map(Value::Object).collect()),
                    );
                }
            }
        }
        Method::FindById => {
            let id = require(definition.id.as_ref(), "a record identifier", op.method)?;
            if definition.joins.is_empty() {
                command.insert("findOne".into(), collection);
                command.insert("filter".into(), json!({ "_id": formats::encode_object_id(id) }));
                put(&mut command, "projection", projection(definition));
            } else {
                let mut pipeline = vec![match_id_stage(id)];
                lookup_stages(&definition.joins, &mut pipeline);
                if let Some(projection) = projection(definition) {
                    pipeline.push(json!({ "$project": projection }));
                }
                command.insert("aggregate".into(), collection);
                command.insert("pipeline".into(), Value::Array(pipeline));
            }
            command.insert("readPreference".into(), json!(read_preference));
        }
        Method::FindOne | Method::FindMany => {
            let single = op.method == Method::FindOne;
            let limit = if single { Some(1) } else { definition.limit };
            if definition.joins.is_empty() {
                let name = if single { "findOne" } else { "find" };
                command.insert(name.into(), collection);
                command.insert("filter".into(), filter(definition));
                put(&mut command, "projection", projection(definition));
                put(&mut command, "sort", sort(&definition.sort));
                put(&mut command, "skip", definition.skip.map(Value::from));
                if !single {
                    put(&mut command, "limit", definition.limit.map(Value::from));
                }
            } else {
                command.insert("aggregate".into(), collection);
                command.insert(
                    "pipeline".into(),
                    Value::Array(read_pipeline(definition, limit)),
                );
            }
            command.insert("readPreference".into(), json!(read_preference));
            if !single && definition.return_count {
                command.insert("returnCount".into(), Value::Bool(true));
            }
        }
        Method::DeleteById => {
            let id = require(definition.id.as_ref(), "a record identifier", op.method)?;
            command.insert("deleteOne".into(), collection);
            command.insert("filter".into(), json!({ "_id": formats::encode_object_id(id) }));
        }
        Method::DeleteOne | Method::DeleteMany => {
            let name = if op.method == Method::DeleteOne { "deleteOne" } else { "deleteMany" };
            if definition.filter_needs_joins() {
                command.insert("aggregate".into(), collection.clone());
                command.insert("pipeline".into(), Value::Array(id_pipeline(definition)));
                command.insert("then".into(), json!({ name: collection, "filter": { "_id": { "$in": "$ids" } } }));
            } else {
                command.insert(name.into(), collection);
                command.insert("filter".into(), filter(definition));
            }
        }
        Method::UpdateById | Method::UpdateOne | Method::UpdateMany => {
            let updates = require(definition.updates.as_ref(), "update instructions", op.method)?;
            let mut update = Map::new();
            update.insert("update".into(), update_definition(updates));
            put(&mut update, "arrayFilters", array_filters(&definition.array_filters));
            let name = if op.method == Method::UpdateMany {
                "updateMany"
            } else {
                update.insert("returnDocument".into(), json!("after"));
                put(&mut update, "projection", projection(definition));
                "findOneAndUpdate"
            };

            if op.method == Method::UpdateById {
                let id = require(definition.id.as_ref(), "a record identifier", op.method)?;
                command.insert(name.into(), collection);
                command.insert("filter".into(), json!({ "_id": formats::encode_object_id(id) }));
                command.extend(update);
            } else if definition.filter_needs_joins() {
                command.insert("aggregate".into(), collection.clone());
                command.insert("pipeline".into(), Value::Array(id_pipeline(definition)));
                let mut then = Map::new();
                then.insert(name.into(), collection);
                then.insert("filter".into(), json!({ "_id": { "$in": "$ids" } }));
                then.extend(update);
                command.insert("then".into(), Value::Object(then));
            } else {
                command.insert(name.into(), collection);
                command.insert("filter".into(), filter(definition));
                command.extend(update);
            }
        }
    }

    Ok(Value::Object(command))
}
