// Environmental monitoring estate
//
// Every object reachable through the federated engine. Adding a source means
// appending an entry here; nothing else changes.

use crate::models::{CatalogEntry, Column, ColumnType, JoinKey, SchemaCatalog, SourceKind};

use ColumnType::{Array, Decimal, Integer, Object, Timestamp};

const REGION_INFO: &str = "postgres.public.`region_info`";
const USER_INFO: &str = "postgres.public.`user_info`";

const fn region_fk() -> JoinKey {
    JoinKey {
        column: "region_id",
        target: REGION_INFO,
        target_column: "region_id",
    }
}

static ENTRIES: &[CatalogEntry] = &[
    // PostgreSQL
    CatalogEntry {
        kind: SourceKind::RelationalTable,
        reference: REGION_INFO,
        description: "Geographic regions for environmental monitoring",
        columns: &[
            Column::new("region_id", Integer),
            Column::new("region_name", ColumnType::String).with_note(
                "e.g. Amazon Basin, Great Barrier Reef, Sahara Desert, Arctic Tundra, \
                 Congo Rainforest, Himalayas, Great Plains, Madagascar",
            ),
            Column::new("latitude", Decimal),
            Column::new("longitude", Decimal),
        ],
        joins: &[],
    },
    CatalogEntry {
        kind: SourceKind::RelationalTable,
        reference: "postgres.public.`climate_data`",
        description: "Climate measurements per region",
        columns: &[
            Column::new("climate_id", Integer),
            Column::new("region_id", Integer),
            Column::new("temperature", Decimal)
                .with_note("degrees C, range -25 to 40 (avg 18); high > 25, low < 10"),
            Column::new("rainfall", Decimal).with_note("mm, range 0-500; high > 200, low < 50"),
            Column::new("humidity", Decimal).with_note("percent, range 20-95; high > 70, low < 40"),
            Column::new("timestamp", Timestamp),
        ],
        joins: &[region_fk()],
    },
    CatalogEntry {
        kind: SourceKind::RelationalTable,
        reference: "postgres.public.`agriculture_data`",
        description: "Agricultural production data",
        columns: &[
            Column::new("agri_id", Integer),
            Column::new("region_id", Integer),
            Column::new("crop_type", ColumnType::String).with_note(
                "Cassava, Cocoa, Wheat, Corn, Soybean, Rice, Vanilla, Barley, Plantain",
            ),
            Column::new("yield", Decimal).with_note("tons"),
            Column::new("season", ColumnType::String).with_note("Spring, Summer, Fall, Winter"),
            Column::new("year", Integer),
        ],
        joins: &[region_fk()],
    },
    // Credential columns (password_hash) are never exposed to the model
    CatalogEntry {
        kind: SourceKind::RelationalTable,
        reference: USER_INFO,
        description: "System users of the platform",
        columns: &[
            Column::new("user_id", Integer),
            Column::new("name", ColumnType::String),
            Column::new("email", ColumnType::String),
            Column::new("role", ColumnType::String)
                .with_note("Researcher, Data Provider, Administrator"),
            Column::new("created_at", Timestamp),
        ],
        joins: &[],
    },
    CatalogEntry {
        kind: SourceKind::RelationalTable,
        reference: "postgres.public.`query_log`",
        description: "Audit trail of executed queries",
        columns: &[
            Column::new("query_id", Integer),
            Column::new("user_id", Integer),
            Column::new("query_text", ColumnType::String),
            Column::new("executed_at", Timestamp),
        ],
        joins: &[JoinKey {
            column: "user_id",
            target: USER_INFO,
            target_column: "user_id",
        }],
    },
    // MongoDB
    CatalogEntry {
        kind: SourceKind::DocumentCollection,
        reference: "mongo.environmental_db.`Biodiversity_Data`",
        description: "Species diversity and conservation data",
        columns: &[
            Column::new("biodiversity_id", ColumnType::String),
            Column::new("region_id", Integer),
            Column::new("region_name", ColumnType::String),
            Column::new("species_count", Integer),
            Column::new("endangered_species", Array).counted_by("species_count"),
            Column::new("dominant_flora", Array),
            Column::new("conservation_status", ColumnType::String)
                .with_note("Critical, Endangered, Vulnerable"),
            Column::new("last_survey_date", Timestamp),
        ],
        joins: &[region_fk()],
    },
    CatalogEntry {
        kind: SourceKind::DocumentCollection,
        reference: "mongo.environmental_db.`Sensor_Logs`",
        description: "Real-time sensor event logs",
        columns: &[
            Column::new("log_id", ColumnType::String),
            Column::new("sensor_id", ColumnType::String),
            Column::new("region_id", Integer),
            Column::new("event_type", ColumnType::String),
            Column::new("severity", ColumnType::String).with_note("warning, critical, info"),
            Column::new("message", ColumnType::String),
            Column::new("timestamp", Timestamp),
        ],
        joins: &[
            region_fk(),
            JoinKey {
                column: "sensor_id",
                target: "mongo.environmental_db.`Sensor_Metadata`",
                target_column: "sensor_id",
            },
        ],
    },
    CatalogEntry {
        kind: SourceKind::DocumentCollection,
        reference: "mongo.environmental_db.`Air_Quality_History`",
        description: "Historical air quality measurements",
        columns: &[
            Column::new("air_quality_id", ColumnType::String),
            Column::new("region_id", Integer),
            Column::new("region_name", ColumnType::String),
            Column::new("aqi", Integer),
            Column::new("air_quality_level", ColumnType::String),
            Column::new("pollutants", Object).with_note("pm2_5, pm10, o3, no2, so2"),
            Column::new("recorded_date", Timestamp),
        ],
        joins: &[region_fk()],
    },
    CatalogEntry {
        kind: SourceKind::DocumentCollection,
        reference: "mongo.environmental_db.`Species_Details`",
        description: "Detailed species information",
        columns: &[
            Column::new("species_id", ColumnType::String),
            Column::new("species_name", ColumnType::String),
            Column::new("scientific_name", ColumnType::String),
            Column::new("classification", Object)
                .with_note("kingdom, phylum, class, order, family, genus"),
            Column::new("habitat", ColumnType::String),
            Column::new("conservation_status", ColumnType::String),
            Column::new("population_estimate", Integer),
        ],
        joins: &[],
    },
    CatalogEntry {
        kind: SourceKind::DocumentCollection,
        reference: "mongo.environmental_db.`Sensor_Metadata`",
        description: "IoT sensor device information",
        columns: &[
            Column::new("sensor_id", ColumnType::String),
            Column::new("sensor_type", ColumnType::String),
            Column::new("location_name", ColumnType::String),
            Column::new("region_id", Integer),
            Column::new("installation_date", Timestamp),
            Column::new("status", ColumnType::String),
            Column::new("last_maintenance", Timestamp),
        ],
        joins: &[region_fk()],
    },
    // CSV
    CatalogEntry {
        kind: SourceKind::FlatFile,
        reference: "dfs.data.`sensor_readings.csv`",
        description: "Real-time CO2 and particulate matter readings",
        columns: &[
            Column::new("timestamp", ColumnType::String).cast_as(Timestamp),
            Column::new("region_id", ColumnType::String).cast_as(Integer),
            Column::new("co2_level", ColumnType::String)
                .cast_as(Decimal)
                .with_note("ppm"),
            Column::new("pm2_5", ColumnType::String)
                .cast_as(Decimal)
                .with_note("ug/m3"),
        ],
        joins: &[region_fk()],
    },
];

static CATALOG: SchemaCatalog = SchemaCatalog {
    version: "2024.11",
    entries: ENTRIES,
};

/// The estate this service generates queries for
pub fn builtin() -> &'static SchemaCatalog {
    &CATALOG
}
