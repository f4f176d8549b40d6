use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::profile::{RiskProfile, RED_FLAGS_FIELD};
use super::schema::Schema;
use super::UnderwritingInputError;

/// Writes the profiles as a pretty-printed JSON array, creating parent directories.
pub fn write_profiles_json<P: AsRef<Path>>(
    path: P,
    profiles: &[RiskProfile],
) -> Result<(), UnderwritingInputError> {
    let path = path.as_ref();
    let io_error = |source| UnderwritingInputError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, profiles).map_err(|source| {
        UnderwritingInputError::Json {
            input: "profiles",
            source,
        }
    })?;
    writer.flush().map_err(io_error)
}

/// One CSV row per profile: schema fields in order, then the flags joined by "; ".
pub fn write_profiles_csv<W: Write>(
    writer: W,
    schema: &Schema,
    profiles: &[RiskProfile],
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = schema.field_names().collect();
    header.push(RED_FLAGS_FIELD);
    csv_writer.write_record(&header)?;

    for profile in profiles {
        let mut row: Vec<String> = schema
            .field_names()
            .map(|field| profile.text(field))
            .collect();
        row.push(profile.red_flags().join("; "));
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}
