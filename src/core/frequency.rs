use crate::core::text::tokenize;
use crate::domain::model::WordFrequency;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    first_seen: usize,
}

/// Counts words over a sequence of texts in a single pass.
#[derive(Debug, Default)]
pub struct WordCounter {
    tallies: HashMap<String, Tally>,
    total: u64,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text(&mut self, text: &str) {
        for word in tokenize(text) {
            self.total += 1;
            let next_index = self.tallies.len();
            match self.tallies.get_mut(word) {
                Some(tally) => tally.count += 1,
                None => {
                    self.tallies.insert(
                        word.to_string(),
                        Tally {
                            count: 1,
                            first_seen: next_index,
                        },
                    );
                }
            }
        }
    }

    pub fn count(&self, word: &str) -> u64 {
        self.tallies.get(word).map(|t| t.count).unwrap_or(0)
    }

    pub fn total_words(&self) -> u64 {
        self.total
    }

    pub fn distinct_words(&self) -> usize {
        self.tallies.len()
    }

    /// The `n` most frequent words not in `exclude`, highest count first.
    /// Equal counts keep the order in which the words first appeared.
    pub fn most_common(&self, n: usize, exclude: &HashSet<String>) -> Vec<WordFrequency> {
        let mut ranked: Vec<(&String, Tally)> = self
            .tallies
            .iter()
            .filter(|(word, _)| !exclude.contains(*word))
            .map(|(word, tally)| (word, *tally))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(a.1.first_seen.cmp(&b.1.first_seen))
        });

        ranked
            .into_iter()
            .take(n)
            .map(|(word, tally)| WordFrequency {
                word: word.clone(),
                frequency: tally.count,
            })
            .collect()
    }
}

impl<'a> FromIterator<&'a str> for WordCounter {
    fn from_iter<I: IntoIterator<Item = &'a str>>(texts: I) -> Self {
        let mut counter = WordCounter::new();
        for text in texts {
            counter.add_text(text);
        }
        counter
    }
}
