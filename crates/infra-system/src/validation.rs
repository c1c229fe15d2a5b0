// Pre-flight filesystem checks for converters
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

use docexec_core::domain::ConversionError;

/// Input must be given, exist, be a regular file and be readable
pub fn check_input(input: &Path) -> Result<(), ConversionError> {
    if input.as_os_str().is_empty() {
        return Err(ConversionError::Validation("Input file not provided".into()));
    }
    if !input.exists() {
        return Err(ConversionError::Validation(format!(
            "Input file '{}' does not exist",
            input.display()
        )));
    }
    if !input.is_file() {
        return Err(ConversionError::Validation(format!(
            "Input '{}' is not a file",
            input.display()
        )));
    }
    File::open(input).map_err(|e| {
        debug!(input = %input.display(), error = %e, "Input open failed");
        ConversionError::InputNotReadable(input.to_path_buf())
    })?;
    Ok(())
}

/// Output must be given; its directory is created when missing
pub fn prepare_output_dir(output: &Path) -> Result<(), ConversionError> {
    if output.as_os_str().is_empty() {
        return Err(ConversionError::Validation("Output file not provided".into()));
    }
    let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "Creating output directory");
        fs::create_dir_all(dir).map_err(|e| {
            ConversionError::Validation(format!(
                "Output directory '{}' could not be created: {}",
                dir.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Profile directory is created (mode 0777) when missing and must be writable
pub fn prepare_profile_dir(program: &str, profile: &Path) -> Result<(), ConversionError> {
    let not_writable = || ConversionError::ProfileNotWritable {
        program: program.to_string(),
        profile: profile.to_path_buf(),
    };

    if !profile.is_dir() {
        debug!(profile = %profile.display(), "Creating converter profile directory");
        create_shared_dir(profile).map_err(|_| not_writable())?;
    }

    if is_writable(profile) {
        Ok(())
    } else {
        Err(not_writable())
    }
}

#[cfg(unix)]
fn create_shared_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o777).create(dir)
}

#[cfg(not(unix))]
fn create_shared_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn is_writable(dir: &Path) -> bool {
    nix::unistd::access(dir, nix::unistd::AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(dir: &Path) -> bool {
    fs::metadata(dir)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_checks() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            check_input(Path::new("")),
            Err(ConversionError::Validation(msg)) if msg == "Input file not provided"
        ));
        assert!(matches!(
            check_input(&dir.path().join("missing.docx")),
            Err(ConversionError::Validation(_))
        ));
        assert!(matches!(
            check_input(dir.path()),
            Err(ConversionError::Validation(msg)) if msg.contains("is not a file")
        ));

        let file = dir.path().join("report.docx");
        fs::write(&file, b"doc").unwrap();
        assert!(check_input(&file).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_input() {
        use std::os::unix::fs::PermissionsExt;

        // root can read anything
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("locked.docx");
        fs::write(&file, b"doc").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o000)).unwrap();

        assert!(matches!(
            check_input(&file),
            Err(ConversionError::InputNotReadable(p)) if p == file
        ));
    }

    #[test]
    fn test_output_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/deeper/out.pdf");

        prepare_output_dir(&output).unwrap();

        assert!(dir.path().join("nested/deeper").is_dir());
        assert!(matches!(
            prepare_output_dir(Path::new("")),
            Err(ConversionError::Validation(_))
        ));
    }

    #[test]
    fn test_profile_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profile");

        prepare_profile_dir("libreoffice", &profile).unwrap();

        assert!(profile.is_dir());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&profile).unwrap().permissions().mode();
            // umask may strip group/other bits
            assert_eq!(mode & 0o700, 0o700);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_profile_dir() {
        use std::os::unix::fs::PermissionsExt;

        if nix::unistd::geteuid().is_root() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profile");
        fs::create_dir(&profile).unwrap();
        fs::set_permissions(&profile, fs::Permissions::from_mode(0o555)).unwrap();

        let err = prepare_profile_dir("libreoffice", &profile).unwrap_err();
        assert!(matches!(err, ConversionError::ProfileNotWritable { .. }));
        assert!(err.to_string().contains("libreoffice"));
    }
}
