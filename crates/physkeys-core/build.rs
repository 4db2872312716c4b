use std::collections::HashSet;
use std::env;
use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const KEY_TABLE_FILE: &str = "keycodes.txt";

struct KeyEntry {
    name: String,
    code: u16,
    aliases: Vec<String>,
}

fn parse_table(source: &str) -> Result<Vec<KeyEntry>, Box<dyn Error>> {
    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(name), Some(code)) = (fields.next(), fields.next()) else {
            return Err(format!("{}:{}: expected `NAME CODE [ALIAS...]`", KEY_TABLE_FILE, index + 1).into());
        };
        let code: u16 = code
            .parse()
            .map_err(|e| format!("{}:{}: bad code {:?}: {}", KEY_TABLE_FILE, index + 1, code, e))?;
        let aliases: Vec<String> = fields.map(str::to_string).collect();

        for spelling in std::iter::once(name).chain(aliases.iter().map(String::as_str)) {
            if !seen.insert(spelling.to_string()) {
                return Err(format!("{}:{}: {} defined twice", KEY_TABLE_FILE, index + 1, spelling).into());
            }
        }
        entries.push(KeyEntry {
            name: name.to_string(),
            code,
            aliases,
        });
    }
    Ok(entries)
}

fn generate(entries: &[KeyEntry]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(
        out,
        r#"/// A physical key code as delivered by the host.
///
/// Numeric values follow Linux input-event-codes.h; hosts on other
/// platforms translate their own keycodes before handing events over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Key(pub u16);

impl From<u16> for Key {{
    fn from(code: u16) -> Self {{
        Key(code)
    }}
}}

impl From<Key> for u16 {{
    fn from(key: Key) -> Self {{
        key.0
    }}
}}

impl fmt::Display for Key {{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {{
        f.write_str(key_name(self.0))
    }}
}}

impl FromStr for Key {{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {{
        key_from_name(s).ok_or_else(|| format!("Unknown key: {{}}", s))
    }}
}}
"#
    )?;

    writeln!(out, "impl Key {{")?;
    for entry in entries {
        writeln!(out, "    pub const {}: Key = Key({});", entry.name, entry.code)?;
    }
    writeln!(out, "}}\n")?;

    writeln!(out, "/// Canonical names, in table order")?;
    writeln!(out, "const KEY_TABLE: &[(&str, u16)] = &[")?;
    for entry in entries {
        writeln!(out, "    ({:?}, {}),", entry.name, entry.code)?;
    }
    writeln!(out, "];\n")?;

    writeln!(out, "/// Alternate spellings accepted in config files and scripts")?;
    writeln!(out, "const KEY_ALIASES: &[(&str, u16)] = &[")?;
    for entry in entries {
        for alias in &entry.aliases {
            writeln!(out, "    ({:?}, {}),", alias, entry.code)?;
        }
    }
    writeln!(out, "];\n")?;

    writeln!(out, "/// Display name for a key code")?;
    writeln!(out, "pub fn key_name(code: u16) -> &'static str {{")?;
    writeln!(out, "    match code {{")?;
    for entry in entries {
        writeln!(out, "        {} => {:?},", entry.code, entry.name)?;
    }
    writeln!(out, "        _ => \"UNKNOWN\",")?;
    writeln!(out, "    }}\n}}")?;

    Ok(out)
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", KEY_TABLE_FILE);

    let source = fs::read_to_string(KEY_TABLE_FILE)?;
    let entries = parse_table(&source)?;
    let code = generate(&entries)?;

    let out_dir = env::var("OUT_DIR")?;
    fs::write(Path::new(&out_dir).join("key_codes.rs"), code)?;
    Ok(())
}
