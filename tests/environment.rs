#[cfg(test)]
mod environment_tests {
    use cmm_interpreter as cmm;

    use cmm::environment::*;
    use cmm::value::Value;

    fn binding(name: &str, n: i64) -> (String, Value) {
        (name.to_string(), Value::Int(n))
    }

    #[test]
    fn test_get_searches_ancestors() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(2));
        let frame = env.push_frame(glob, [binding("y", 3)]);

        assert_eq!(env.get(frame, "x"), Some(&Value::Int(2)));
        assert_eq!(env.get(frame, "y"), Some(&Value::Int(3)));
        assert_eq!(env.get(glob, "y"), None);
        assert_eq!(env.get(frame, "z"), None);
    }

    #[test]
    fn test_set_in_own_frame() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(2));
        env.set(glob, "x", Value::Int(3));

        assert_eq!(env.get(glob, "x"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_construction_overrides_ancestor() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(2));

        let child = env.push_frame(glob, [binding("x", 3)]);

        assert_eq!(env.get(glob, "x"), Some(&Value::Int(3)));
        assert_eq!(env.get(child, "x"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_set_writes_through_to_ancestor() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(2));
        let child = env.push_block(glob);

        env.set(child, "x", Value::Int(5));
        assert_eq!(env.get(glob, "x"), Some(&Value::Int(5)));

        // New names stay local
        env.set(child, "b", Value::Int(3));
        assert_eq!(env.get(glob, "b"), None);
        assert_eq!(env.get(child, "b"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_write_through_reaches_every_ancestor_binding() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(1));
        let middle = env.push_block(glob);
        env.define(middle, "x", Value::Int(10));
        let inner = env.push_block(middle);

        env.set(inner, "x", Value::Int(7));

        assert_eq!(env.get(glob, "x"), Some(&Value::Int(7)));
        assert_eq!(env.get(middle, "x"), Some(&Value::Int(7)));
        assert_eq!(env.get(inner, "x"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_define_shadows_without_write_through() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(1));
        let child = env.push_block(glob);

        env.define(child, "x", Value::Int(0));

        assert_eq!(env.get(child, "x"), Some(&Value::Int(0)));
        assert_eq!(env.get(glob, "x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_siblings_do_not_see_each_other() {
        let mut env = Environment::new();
        let glob = env.global();
        let left = env.push_frame(glob, [binding("a", 1)]);
        let right = env.push_block(glob);

        assert_eq!(env.get(left, "a"), Some(&Value::Int(1)));
        assert_eq!(env.get(right, "a"), None);
    }

    #[test]
    fn test_chain_and_locals() {
        let mut env = Environment::new();
        let glob = env.global();
        let child = env.push_frame(glob, [binding("y", 2), binding("x", 1)]);
        let grandchild = env.push_block(child);

        assert_eq!(env.chain(grandchild).collect::<Vec<_>>(), vec![grandchild, child, glob]);
        assert_eq!(env.parent(glob), None);
        assert_eq!(env.frame_count(), 3);

        let locals: Vec<(&str, &Value)> = env.locals(child).into_iter().collect();
        assert_eq!(locals, vec![("x", &Value::Int(1)), ("y", &Value::Int(2))]);
    }

    #[test]
    fn test_display_lists_frames() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(2));
        env.push_frame(glob, [binding("y", 3)]);

        assert_eq!(env.to_string(), "#0 {x: 2}\n#1 -> #0 {y: 3}\n");
    }

    #[test]
    fn test_reads_see_writes_from_sibling_frames() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(0));

        let caller = env.push_block(glob);
        env.set(caller, "x", Value::Int(1));
        let callee = env.push_block(glob);
        env.set(callee, "x", Value::Int(5));

        assert_eq!(env.get(glob, "x"), Some(&Value::Int(5)));
        assert_eq!(env.get(caller, "x"), Some(&Value::Int(5)));
        assert_eq!(env.locals(caller).get("x"), Some(&&Value::Int(5)));
    }

    #[test]
    fn test_parameter_shares_cell_with_ancestor() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "n", Value::Int(1));
        let call = env.push_frame(glob, [binding("n", 9)]);

        env.set(glob, "n", Value::Int(4));

        assert_eq!(env.get(call, "n"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_define_replaces_shared_binding() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(1));
        let child = env.push_block(glob);
        env.set(child, "x", Value::Int(2));

        env.define(child, "x", Value::Int(0));
        env.set(glob, "x", Value::Int(8));

        assert_eq!(env.get(child, "x"), Some(&Value::Int(0)));
        assert_eq!(env.get(glob, "x"), Some(&Value::Int(8)));
    }

    #[test]
    fn test_pop_frame_releases_frame() {
        let mut env = Environment::new();
        let glob = env.global();
        env.define(glob, "x", Value::Int(1));

        let call = env.push_frame(glob, [binding("n", 3)]);
        let block = env.push_block(call);
        env.define(block, "t", Value::Int(2));
        env.pop_frame(block);
        env.pop_frame(call);

        assert_eq!(env.frame_count(), 1);
        assert_eq!(env.to_string(), "#0 {x: 1}\n");

        // Released ids are reused
        let next = env.push_block(glob);
        assert_eq!(next, call);
        assert_eq!(env.get(next, "n"), None);
    }

    #[test]
    fn test_captured_frame_outlives_pop() {
        let mut env = Environment::new();
        let glob = env.global();
        let outer = env.push_frame(glob, [binding("a", 1)]);

        env.capture(outer);
        env.pop_frame(outer);

        assert_eq!(env.frame_count(), 2);
        assert_eq!(env.get(outer, "a"), Some(&Value::Int(1)));
    }
}
