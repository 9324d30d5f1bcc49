//! Fusión determinista de campos de formulario.
//!
//! Merge "shallow": las claves de `b` reemplazan a las de `a`. Las claves ya
//! presentes conservan su posición; las nuevas se agregan al final en el orden
//! de `b`.

use indexmap::IndexMap;

pub fn merge_fields(a: &IndexMap<String, String>, b: &IndexMap<String, String>) -> IndexMap<String, String> {
    let mut out = a.clone();
    for (k, v) in b.iter() {
        out.insert(k.clone(), v.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_and_appends() {
        let a: IndexMap<String, String> = [("x", "1"), ("keep", "a")].into_iter()
                                                                      .map(|(k, v)| (k.to_string(), v.to_string()))
                                                                      .collect();
        let b: IndexMap<String, String> = [("new", "n"), ("x", "2")].into_iter()
                                                                    .map(|(k, v)| (k.to_string(), v.to_string()))
                                                                    .collect();
        let out = merge_fields(&a, &b);
        let keys: Vec<&str> = out.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["x", "keep", "new"]);
        assert_eq!(out["x"], "2");
    }
}
