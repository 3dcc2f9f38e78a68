#[cfg(test)]
pub mod test {
    use std::sync::{Arc, Mutex};

    use confique::Config;

    use crate::directive::Directives;
    use crate::error::ScopefigError;
    use crate::parser::FormatParser;
    use crate::registry::FormatRegistry;
    use crate::types::Resource;

    /// What a per-directory worker config usually looks like: where to
    /// listen, plus a nested cache section.
    #[derive(Config, Debug)]
    pub struct ServiceConfig {
        #[config(default = "0.0.0.0")]
        pub bind: String,

        #[config(default = 9000)]
        pub port: u16,

        #[config(default = false)]
        pub trace: bool,

        #[config(nested)]
        pub cache: CacheConfig,
    }

    #[derive(Config, Debug)]
    pub struct CacheConfig {
        /// Unset means in-memory only.
        pub dir: Option<String>,

        #[config(default = 64)]
        pub capacity: usize,
    }

    /// Has no default; some resource must set it.
    #[derive(Config, Debug)]
    pub struct RequiredConfig {
        pub name: String,
    }

    /// A parser that claims a fixed set of extensions and records every
    /// resource identity it is asked to parse. It never touches the disk.
    #[derive(Debug)]
    pub struct RecordingParser {
        name: String,
        extensions: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingParser {
        pub fn new(name: &str, extensions: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                extensions: extensions.iter().map(|e| e.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FormatParser for RecordingParser {
        fn name(&self) -> &str {
            &self.name
        }

        fn supports(&self, resource: &Resource, type_hint: Option<&str>) -> bool {
            let ext = resource.extension();
            resource.as_path().is_some()
                && type_hint.is_none()
                && self.extensions.iter().any(|e| e == ext)
        }

        fn parse(
            &self,
            resource: &Resource,
            _type_hint: Option<&str>,
            _registry: &mut FormatRegistry,
        ) -> Result<Directives, ScopefigError> {
            self.calls.lock().unwrap().push(resource.identity());
            let mut out = Directives::new();
            out.set("parsed_by", self.name.as_str())
                .set("resource", resource.identity());
            Ok(out)
        }
    }
}
