use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};

use rollfile_base::FilePath;

use crate::layout::PathLayout;
use crate::location::Location;

/// Caller supplied path function.
///
/// Receives the current instant, already converted to the writer's location,
/// and the number of resolutions performed before this one.
pub type PathGenerator = Box<dyn Fn(DateTime<FixedOffset>, u64) -> String + Send + Sync>;

enum PathSource {
    Template(PathLayout),
    Generator(PathGenerator),
}

/// Maps the current instant to the path a write should target.
pub struct PathResolver {
    source: PathSource,
    iteration: u64,
}

impl PathResolver {
    pub fn template(layout: PathLayout) -> Self {
        Self {
            source: PathSource::Template(layout),
            iteration: 0,
        }
    }

    pub fn generator(
        generator: impl Fn(DateTime<FixedOffset>, u64) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            source: PathSource::Generator(Box::new(generator)),
            iteration: 0,
        }
    }

    /// Resolve the target path for `now`.
    ///
    /// Every call counts as one iteration, whichever source is configured. The
    /// first call hands 0 to a generator.
    pub fn resolve(&mut self, now: DateTime<Utc>, location: &Location) -> FilePath {
        let local = location.localize(now);
        let iteration = self.iteration;
        self.iteration += 1;
        match &self.source {
            PathSource::Template(layout) => FilePath::from(layout.format(&local, location)),
            PathSource::Generator(generator) => FilePath::from(generator(local, iteration)),
        }
    }

    /// Number of resolutions performed so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// The template, when the resolver is template based.
    pub fn layout(&self) -> Option<&PathLayout> {
        match &self.source {
            PathSource::Template(layout) => Some(layout),
            PathSource::Generator(_) => None,
        }
    }
}

impl fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("PathResolver");
        match &self.source {
            PathSource::Template(layout) => debug.field("template", &layout.as_str()),
            PathSource::Generator(_) => debug.field("generator", &"<fn>"),
        };
        debug.field("iteration", &self.iteration).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::sync::{Arc, Mutex};

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 3, 0, 0).unwrap()
    }

    #[test]
    fn test_template_resolution_uses_location() {
        let mut resolver = PathResolver::template(PathLayout::parse("2006-01-02.txt").unwrap());

        let utc = resolver.resolve(instant(), &Location::Utc);
        let pacific = resolver.resolve(instant(), &Location::fixed(-8 * 3600).unwrap());

        assert_eq!(utc.as_str(), "2024-03-10.txt");
        assert_eq!(pacific.as_str(), "2024-03-09.txt");
        assert_eq!(resolver.iteration(), 2);
    }

    #[test]
    fn test_generator_receives_counter_and_local_time() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&seen);
        let mut resolver = PathResolver::generator(move |now, iteration| {
            recorded.lock().unwrap().push((now.hour(), iteration));
            format!("part-{}.log", iteration)
        });
        let location = Location::fixed(2 * 3600).unwrap();

        let paths: Vec<_> = (0..3)
            .map(|_| resolver.resolve(instant(), &location).as_str().to_string())
            .collect();

        assert_eq!(paths, ["part-0.log", "part-1.log", "part-2.log"]);
        assert_eq!(*seen.lock().unwrap(), [(5, 0), (5, 1), (5, 2)]);
        assert!(resolver.layout().is_none());
    }

    #[test]
    fn test_debug_output() {
        let resolver = PathResolver::template(PathLayout::parse("2006.log").unwrap());
        assert_eq!(
            format!("{:?}", resolver),
            r#"PathResolver { template: "2006.log", iteration: 0 }"#
        );
    }
}
