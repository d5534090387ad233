use std::fs::File;
use std::io::Read;
use std::path::Path;

use mime_guess::mime;

use crate::model::{ClassifierKind, MediaCategory};

const SNIFF_LEN: u64 = 8192;

/// Decides whether a file should be treated as text.
pub trait TextClassifier {
    fn kind(&self) -> ClassifierKind;

    fn classify(&self, path: &Path) -> MediaCategory;
}

/// Guesses the media type from the file name alone. Never touches the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionClassifier;

impl TextClassifier for ExtensionClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Extension
    }

    fn classify(&self, path: &Path) -> MediaCategory {
        match mime_guess::from_path(path).first() {
            None => MediaCategory::Unknown,
            Some(guess) if guess.type_() == mime::TEXT => MediaCategory::Text,
            Some(guess) => MediaCategory::Binary {
                top_level: guess.type_().as_str().to_string(),
            },
        }
    }
}

/// Sniffs the head of the file: NUL bytes or invalid UTF-8 mean binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentClassifier;

impl TextClassifier for ContentClassifier {
    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Content
    }

    fn classify(&self, path: &Path) -> MediaCategory {
        let mut head = Vec::new();
        let read = File::open(path).and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut head));
        if read.is_err() {
            return MediaCategory::Unknown;
        }
        if looks_like_text(&head) {
            MediaCategory::Text
        } else {
            MediaCategory::Binary {
                top_level: "binary".to_string(),
            }
        }
    }
}

fn looks_like_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        // A multi-byte code point cut off by the sniff window is still text.
        Err(err) => err.error_len().is_none(),
    }
}

pub fn classifier_for(kind: ClassifierKind) -> Box<dyn TextClassifier> {
    match kind {
        ClassifierKind::Extension => Box::new(ExtensionClassifier),
        ClassifierKind::Content => Box::new(ContentClassifier),
    }
}
