//! [`SqliteStore`] — the SQLite implementation of [`ChartStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use stemma_core::{
  ChartStore, ChildLink, FamilyRecord, NewChildLink, NewFamily, NewPerson,
  PersonRecord,
};

use crate::{
  Result,
  encode::{
    decode_dt, decode_opt_uuid, decode_sex, decode_uuid, decode_vitals,
    encode_dt, encode_sex, encode_uuid, encode_vitals, pair_key,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Stemma chart store backed by a single SQLite file.
pub struct SqliteStore {
  conn: rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn })
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    let conn = rusqlite::Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn })
  }

  /// All people of a source in first-seen order.
  pub fn people(&self, source_id: Uuid) -> Result<Vec<PersonRecord>> {
    let source = encode_uuid(source_id);
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {PERSON_COLUMNS} FROM people WHERE source_id = ?1 ORDER BY rowid"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![source], person_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawPerson::into_person).collect()
  }

  /// All families of a source in first-seen order.
  pub fn families(&self, source_id: Uuid) -> Result<Vec<FamilyRecord>> {
    let source = encode_uuid(source_id);
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {FAMILY_COLUMNS} FROM families WHERE source_id = ?1 ORDER BY rowid"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![source], family_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawFamily::into_family).collect()
  }
}

// ─── Raw row types ───────────────────────────────────────────────────────────

const PERSON_COLUMNS: &str = "person_id, source_id, generation, display_name, \
   given, surname, surname_inferred, title, sex, birth_json, death_json, \
   notes, chart_id, norm_given, norm_surname, fingerprint, page_index, \
   line_index, approx, created_at";

struct RawPerson {
  person_id:        String,
  source_id:        String,
  generation:       i64,
  display_name:     String,
  given:            Option<String>,
  surname:          Option<String>,
  surname_inferred: bool,
  title:            Option<String>,
  sex:              Option<String>,
  birth_json:       Option<String>,
  death_json:       Option<String>,
  notes:            Option<String>,
  chart_id:         Option<String>,
  norm_given:       Option<String>,
  norm_surname:     Option<String>,
  fingerprint:      Option<String>,
  page_index:       Option<i64>,
  line_index:       Option<i64>,
  approx:           bool,
  created_at:       String,
}

fn person_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPerson> {
  Ok(RawPerson {
    person_id:        row.get(0)?,
    source_id:        row.get(1)?,
    generation:       row.get(2)?,
    display_name:     row.get(3)?,
    given:            row.get(4)?,
    surname:          row.get(5)?,
    surname_inferred: row.get(6)?,
    title:            row.get(7)?,
    sex:              row.get(8)?,
    birth_json:       row.get(9)?,
    death_json:       row.get(10)?,
    notes:            row.get(11)?,
    chart_id:         row.get(12)?,
    norm_given:       row.get(13)?,
    norm_surname:     row.get(14)?,
    fingerprint:      row.get(15)?,
    page_index:       row.get(16)?,
    line_index:       row.get(17)?,
    approx:           row.get(18)?,
    created_at:       row.get(19)?,
  })
}

impl RawPerson {
  fn into_person(self) -> Result<PersonRecord> {
    Ok(PersonRecord {
      id:               decode_uuid(&self.person_id)?,
      source_id:        decode_uuid(&self.source_id)?,
      generation:       self.generation as u32,
      display_name:     self.display_name,
      given:            self.given,
      surname:          self.surname,
      surname_inferred: self.surname_inferred,
      title:            self.title,
      sex:              self.sex.as_deref().map(decode_sex).transpose()?,
      birth:            decode_vitals(self.birth_json.as_deref())?,
      death:            decode_vitals(self.death_json.as_deref())?,
      notes:            self.notes,
      chart_id:         self.chart_id,
      norm_given:       self.norm_given,
      norm_surname:     self.norm_surname,
      fingerprint:      self.fingerprint,
      page_index:       self.page_index.map(|v| v as usize),
      line_index:       self.line_index.map(|v| v as usize),
      approx:           self.approx,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

const FAMILY_COLUMNS: &str = "family_id, source_id, husband_id, wife_id, \
   fingerprint, approx, page_index, created_at";

struct RawFamily {
  family_id:   String,
  source_id:   String,
  husband_id:  Option<String>,
  wife_id:     Option<String>,
  fingerprint: Option<String>,
  approx:      bool,
  page_index:  Option<i64>,
  created_at:  String,
}

fn family_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFamily> {
  Ok(RawFamily {
    family_id:   row.get(0)?,
    source_id:   row.get(1)?,
    husband_id:  row.get(2)?,
    wife_id:     row.get(3)?,
    fingerprint: row.get(4)?,
    approx:      row.get(5)?,
    page_index:  row.get(6)?,
    created_at:  row.get(7)?,
  })
}

impl RawFamily {
  fn into_family(self) -> Result<FamilyRecord> {
    Ok(FamilyRecord {
      id:          decode_uuid(&self.family_id)?,
      source_id:   decode_uuid(&self.source_id)?,
      husband_id:  decode_opt_uuid(self.husband_id.as_deref())?,
      wife_id:     decode_opt_uuid(self.wife_id.as_deref())?,
      fingerprint: self.fingerprint,
      approx:      self.approx,
      page_index:  self.page_index.map(|v| v as usize),
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

const CHILD_COLUMNS: &str =
  "child_id, family_id, person_id, ordinal, fingerprint, approx, created_at";

struct RawChild {
  child_id:    String,
  family_id:   String,
  person_id:   String,
  ordinal:     i64,
  fingerprint: Option<String>,
  approx:      bool,
  created_at:  String,
}

fn child_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawChild> {
  Ok(RawChild {
    child_id:    row.get(0)?,
    family_id:   row.get(1)?,
    person_id:   row.get(2)?,
    ordinal:     row.get(3)?,
    fingerprint: row.get(4)?,
    approx:      row.get(5)?,
    created_at:  row.get(6)?,
  })
}

impl RawChild {
  fn into_link(self) -> Result<ChildLink> {
    Ok(ChildLink {
      id:          decode_uuid(&self.child_id)?,
      family_id:   decode_uuid(&self.family_id)?,
      person_id:   decode_uuid(&self.person_id)?,
      ordinal:     self.ordinal as u32,
      fingerprint: self.fingerprint,
      approx:      self.approx,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

// ─── ChartStore impl ─────────────────────────────────────────────────────────

impl ChartStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────

  fn insert_person(&self, input: NewPerson) -> Result<PersonRecord> {
    let norm_given = input.norm_given();
    let norm_surname = input.norm_surname();
    let record = PersonRecord {
      id: Uuid::new_v4(),
      source_id: input.source_id,
      generation: input.generation,
      display_name: input.display_name,
      given: input.given,
      surname: input.surname,
      surname_inferred: input.surname_inferred,
      title: input.title,
      sex: input.sex,
      birth: input.birth,
      death: input.death,
      notes: input.notes,
      chart_id: input.chart_id,
      norm_given,
      norm_surname,
      fingerprint: input.fingerprint,
      page_index: input.page_index,
      line_index: input.line_index,
      approx: input.approx,
      created_at: Utc::now(),
    };

    self.conn.execute(
      "INSERT INTO people (
         person_id, source_id, generation, display_name, given, surname,
         surname_inferred, title, sex, birth_json, death_json, notes,
         chart_id, norm_given, norm_surname, fingerprint, page_index,
         line_index, approx, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                 ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
      rusqlite::params![
        encode_uuid(record.id),
        encode_uuid(record.source_id),
        record.generation as i64,
        record.display_name,
        record.given,
        record.surname,
        record.surname_inferred,
        record.title,
        record.sex.map(encode_sex),
        encode_vitals(record.birth.as_ref())?,
        encode_vitals(record.death.as_ref())?,
        record.notes,
        record.chart_id,
        record.norm_given,
        record.norm_surname,
        record.fingerprint,
        record.page_index.map(|v| v as i64),
        record.line_index.map(|v| v as i64),
        record.approx,
        encode_dt(record.created_at),
      ],
    )?;
    Ok(record)
  }

  fn update_person(&self, person: &PersonRecord) -> Result<()> {
    self.conn.execute(
      "UPDATE people SET
         display_name = ?2, given = ?3, surname = ?4, surname_inferred = ?5,
         title = ?6, sex = ?7, birth_json = ?8, death_json = ?9, notes = ?10,
         chart_id = ?11, norm_given = ?12, norm_surname = ?13,
         fingerprint = ?14, approx = ?15
       WHERE person_id = ?1",
      rusqlite::params![
        encode_uuid(person.id),
        person.display_name,
        person.given,
        person.surname,
        person.surname_inferred,
        person.title,
        person.sex.map(encode_sex),
        encode_vitals(person.birth.as_ref())?,
        encode_vitals(person.death.as_ref())?,
        person.notes,
        person.chart_id,
        person.norm_given,
        person.norm_surname,
        person.fingerprint,
        person.approx,
      ],
    )?;
    Ok(())
  }

  fn person_by_fingerprint(
    &self,
    source_id: Uuid,
    fingerprint: &str,
  ) -> Result<Option<PersonRecord>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {PERSON_COLUMNS} FROM people
           WHERE source_id = ?1 AND fingerprint = ?2"
        ),
        rusqlite::params![encode_uuid(source_id), fingerprint],
        person_from_row,
      )
      .optional()?;
    raw.map(RawPerson::into_person).transpose()
  }

  fn people_by_surname(
    &self,
    source_id: Uuid,
    norm_surname: &str,
  ) -> Result<Vec<PersonRecord>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {PERSON_COLUMNS} FROM people
       WHERE source_id = ?1 AND norm_surname = ?2
       ORDER BY rowid"
    ))?;
    let raws = stmt
      .query_map(
        rusqlite::params![encode_uuid(source_id), norm_surname],
        person_from_row,
      )?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Families ──────────────────────────────────────────────────────────

  fn insert_family(&self, input: NewFamily) -> Result<FamilyRecord> {
    let record = FamilyRecord {
      id: Uuid::new_v4(),
      source_id: input.source_id,
      husband_id: input.husband_id,
      wife_id: input.wife_id,
      fingerprint: input.fingerprint,
      approx: input.approx,
      page_index: input.page_index,
      created_at: Utc::now(),
    };

    self.conn.execute(
      "INSERT INTO families (
         family_id, source_id, husband_id, wife_id, pair_key, fingerprint,
         approx, page_index, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
      rusqlite::params![
        encode_uuid(record.id),
        encode_uuid(record.source_id),
        record.husband_id.map(encode_uuid),
        record.wife_id.map(encode_uuid),
        pair_key(record.husband_id, record.wife_id),
        record.fingerprint,
        record.approx,
        record.page_index.map(|v| v as i64),
        encode_dt(record.created_at),
      ],
    )?;
    Ok(record)
  }

  fn update_family(&self, family: &FamilyRecord) -> Result<()> {
    // pair_key tracks the slots so a single-parent placeholder upgraded to
    // a couple becomes findable by canonical pair.
    self.conn.execute(
      "UPDATE families SET
         husband_id = ?2, wife_id = ?3, pair_key = ?4, fingerprint = ?5,
         approx = ?6
       WHERE family_id = ?1",
      rusqlite::params![
        encode_uuid(family.id),
        family.husband_id.map(encode_uuid),
        family.wife_id.map(encode_uuid),
        pair_key(family.husband_id, family.wife_id),
        family.fingerprint,
        family.approx,
      ],
    )?;
    Ok(())
  }

  fn family_by_pair(
    &self,
    source_id: Uuid,
    a: Uuid,
    b: Uuid,
  ) -> Result<Option<FamilyRecord>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {FAMILY_COLUMNS} FROM families
           WHERE source_id = ?1 AND pair_key = ?2"
        ),
        rusqlite::params![
          encode_uuid(source_id),
          pair_key(Some(a), Some(b)),
        ],
        family_from_row,
      )
      .optional()?;
    raw.map(RawFamily::into_family).transpose()
  }

  fn single_parent_family(
    &self,
    source_id: Uuid,
    parent_id: Uuid,
  ) -> Result<Option<FamilyRecord>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {FAMILY_COLUMNS} FROM families
           WHERE source_id = ?1
             AND ((husband_id = ?2 AND wife_id IS NULL)
               OR (wife_id = ?2 AND husband_id IS NULL))
           ORDER BY rowid
           LIMIT 1"
        ),
        rusqlite::params![encode_uuid(source_id), encode_uuid(parent_id)],
        family_from_row,
      )
      .optional()?;
    raw.map(RawFamily::into_family).transpose()
  }

  // ── Child links ───────────────────────────────────────────────────────

  fn insert_child_link(&self, input: NewChildLink) -> Result<ChildLink> {
    let record = ChildLink {
      id: Uuid::new_v4(),
      family_id: input.family_id,
      person_id: input.person_id,
      ordinal: input.ordinal,
      fingerprint: input.fingerprint,
      approx: input.approx,
      created_at: Utc::now(),
    };

    self.conn.execute(
      "INSERT INTO children (
         child_id, family_id, person_id, ordinal, fingerprint, approx,
         created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      rusqlite::params![
        encode_uuid(record.id),
        encode_uuid(record.family_id),
        encode_uuid(record.person_id),
        record.ordinal as i64,
        record.fingerprint,
        record.approx,
        encode_dt(record.created_at),
      ],
    )?;
    Ok(record)
  }

  fn child_link(
    &self,
    family_id: Uuid,
    person_id: Uuid,
  ) -> Result<Option<ChildLink>> {
    let raw = self
      .conn
      .query_row(
        &format!(
          "SELECT {CHILD_COLUMNS} FROM children
           WHERE family_id = ?1 AND person_id = ?2"
        ),
        rusqlite::params![encode_uuid(family_id), encode_uuid(person_id)],
        child_from_row,
      )
      .optional()?;
    raw.map(RawChild::into_link).transpose()
  }

  fn child_links(&self, family_id: Uuid) -> Result<Vec<ChildLink>> {
    let mut stmt = self.conn.prepare(&format!(
      "SELECT {CHILD_COLUMNS} FROM children
       WHERE family_id = ?1
       ORDER BY ordinal"
    ))?;
    let raws = stmt
      .query_map(rusqlite::params![encode_uuid(family_id)], child_from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawChild::into_link).collect()
  }
}
