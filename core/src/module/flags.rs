use super::error::ModuleError;

/// Command flags, declared as a space separated flag string at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandFlags {
    pub write: bool,
    pub readonly: bool,
    pub fast: bool,
    pub deny_oom: bool,
}

impl CommandFlags {
    pub fn parse(flags: &str) -> Result<Self, ModuleError> {
        let mut parsed = Self::default();
        for flag in flags.split_ascii_whitespace() {
            match flag.to_ascii_lowercase().as_str() {
                "write" => parsed.write = true,
                "readonly" => parsed.readonly = true,
                "fast" => parsed.fast = true,
                "deny-oom" => parsed.deny_oom = true,
                _ => return Err(ModuleError::InvalidFlag(flag.to_string())),
            }
        }

        if parsed.write && parsed.readonly {
            return Err(ModuleError::InvalidFlag("write and readonly are exclusive".to_string()));
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_write_command_flags() {
        let flags = CommandFlags::parse("fast write deny-oom").unwrap();
        assert!(flags.write);
        assert!(flags.fast);
        assert!(flags.deny_oom);
        assert!(!flags.readonly);
    }

    #[test]
    fn empty_string_means_no_flags() {
        assert_eq!(CommandFlags::parse("").unwrap(), CommandFlags::default());
    }

    #[test]
    fn rejects_unknown_flag() {
        let err = CommandFlags::parse("fast no-such-flag").unwrap_err();
        assert!(matches!(err, ModuleError::InvalidFlag(f) if f == "no-such-flag"));
    }

    #[test]
    fn rejects_write_with_readonly() {
        CommandFlags::parse("write readonly").unwrap_err();
    }
}
