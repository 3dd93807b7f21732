//! Pre-flight availability check for the clustering artifacts.
//!
//! Only existence and size are inspected; nothing is parsed.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Artifact, paths};

/// Width of the horizontal rules in the printed report.
const RULE_WIDTH: usize = 70;

/// Presence of one artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    pub artifact: Artifact,
    pub path: PathBuf,
    /// File size in bytes, or `None` when the file is missing.
    pub size_bytes: Option<u64>,
}

impl FileStatus {
    #[must_use]
    pub const fn exists(&self) -> bool {
        self.size_bytes.is_some()
    }

    /// Status column of the printed report.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn status_text(&self) -> String {
        self.size_bytes.map_or_else(
            || "ERROR - NO ENCONTRADO".to_string(),
            |bytes| format!("OK - Encontrado ({:.1} KB)", bytes as f64 / 1024.0),
        )
    }
}

/// Presence of every required artifact in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityReport {
    pub base_dir: PathBuf,
    pub files: Vec<FileStatus>,
}

impl AvailabilityReport {
    /// Inspects `dir` for every [`Artifact`].
    #[must_use]
    pub fn check(dir: &Path) -> Self {
        let files = Artifact::all()
            .iter()
            .map(|artifact| {
                let path = paths::artifact_path(dir, *artifact);
                let size_bytes = std::fs::metadata(&path)
                    .ok()
                    .filter(std::fs::Metadata::is_file)
                    .map(|m| m.len());
                FileStatus {
                    artifact: *artifact,
                    path,
                    size_bytes,
                }
            })
            .collect();

        Self {
            base_dir: dir.to_path_buf(),
            files,
        }
    }

    #[must_use]
    pub fn all_present(&self) -> bool {
        self.files.iter().all(FileStatus::exists)
    }

    /// The artifacts that are missing.
    #[must_use]
    pub fn missing(&self) -> Vec<Artifact> {
        self.files
            .iter()
            .filter(|f| !f.exists())
            .map(|f| f.artifact)
            .collect()
    }

    /// Process exit code for the check: 0 when complete, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.all_present())
    }

    /// Prints the human-readable report.
    ///
    /// # Errors
    ///
    /// Returns any error from writing to `out`.
    pub fn write_report(&self, out: &mut impl Write) -> std::io::Result<()> {
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(out, "Verificando archivos de datos requeridos...")?;
        writeln!(out, "Ruta base: {}", self.base_dir.display())?;
        writeln!(out, "{rule}")?;

        for file in &self.files {
            writeln!(
                out,
                "{:<40} {}",
                file.artifact.file_name(),
                file.status_text()
            )?;
        }

        writeln!(out, "{rule}")?;

        if self.all_present() {
            writeln!(out, "OK - Todos los archivos requeridos existen!")?;
            writeln!(out)?;
            writeln!(out, "Puedes ejecutar la aplicacion con:")?;
            writeln!(out, "  cargo run --bin cluster_map_server")?;
        } else {
            writeln!(out, "ERROR - Faltan archivos requeridos!")?;
            writeln!(out)?;
            writeln!(out, "Para generar los datos:")?;
            writeln!(
                out,
                "  1. Abre el notebook: 2_Modelado/07_hierarchical_6clusters.ipynb"
            )?;
            writeln!(out, "  2. Ejecuta todas las celdas (Run All)")?;
            writeln!(out, "  3. Verifica que se creo la carpeta results_hierarchical_k6")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::write_fixture;

    fn report_text(report: &AvailabilityReport) -> String {
        let mut out = Vec::new();
        report.write_report(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn complete_directory_passes() {
        let dir = write_fixture("cluster_map_check_complete");
        let report = AvailabilityReport::check(&dir);

        assert!(report.all_present());
        assert!(report.missing().is_empty());
        assert_eq!(report.exit_code(), 0);

        let text = report_text(&report);
        assert!(text.contains("OK - Todos los archivos requeridos existen!"));
        assert!(text.contains("hierarchical_k6_clustered_places.csv     OK - Encontrado ("));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_fails() {
        let dir = write_fixture("cluster_map_check_missing");
        std::fs::remove_file(dir.join(Artifact::ClusterStatistics.file_name())).unwrap();

        let report = AvailabilityReport::check(&dir);
        assert!(!report.all_present());
        assert_eq!(report.missing(), vec![Artifact::ClusterStatistics]);
        assert_eq!(report.exit_code(), 1);

        let text = report_text(&report);
        assert!(text.contains("hierarchical_k6_cluster_statistics.csv   ERROR - NO ENCONTRADO"));
        assert!(text.contains("ERROR - Faltan archivos requeridos!"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn nonexistent_directory_reports_everything_missing() {
        let dir = std::env::temp_dir().join("cluster_map_check_nowhere");
        let _ = std::fs::remove_dir_all(&dir);

        let report = AvailabilityReport::check(&dir);
        assert_eq!(report.missing().len(), 4);
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn sizes_are_reported_in_kilobytes() {
        let status = FileStatus {
            artifact: Artifact::Characteristics,
            path: PathBuf::from("x"),
            size_bytes: Some(2048),
        };
        assert_eq!(status.status_text(), "OK - Encontrado (2.0 KB)");
    }
}
