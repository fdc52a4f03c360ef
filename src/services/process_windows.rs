use crate::events::WindowId;
use crate::native::{Atom, NativeConnection};
use crate::trace_if_enabled;
use std::collections::HashSet;

/// Обходит дерево окон от `root` в прямом порядке и собирает окна, у
/// которых свойство `atom` равно `pid`.
///
/// Явный стек вместо рекурсии: глубина дерева ничем не ограничена.
/// Ошибка чтения свойства или QueryTree для узла означает "здесь
/// совпадений нет" и обход продолжается. Дерево может меняться во время
/// обхода, поэтому результат - снимок; повторно встреченное окно
/// (переподвешенное на лету) не добавляется дважды.
pub fn collect_windows_of_process<C: NativeConnection>(
    conn: &C,
    root: WindowId,
    pid: u32,
    atom: Atom,
) -> Vec<WindowId> {
    let mut found = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(window) = stack.pop() {
        if !visited.insert(window) {
            continue;
        }

        match conn.cardinal_property(window, atom) {
            Ok(Some(value)) if value == pid => found.push(window),
            Ok(_) => {}
            Err(e) => trace_if_enabled!("Свойство pid окна {} недоступно: {}", window, e),
        }

        match conn.query_tree(window) {
            // Дети в обратном порядке, чтобы первый ребёнок снимался со стека первым
            Ok(children) => stack.extend(children.into_iter().rev()),
            Err(e) => trace_if_enabled!("QueryTree для окна {} не удался: {}", window, e),
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::events::Messenger;
    use crate::native::fake::{FakeOpener, FAKE_ROOT};
    use crate::services::PointerSystem;
    use std::collections::HashSet;

    fn initialized(opener: &FakeOpener) -> PointerSystem<FakeOpener> {
        let mut system = PointerSystem::new(opener.clone(), Config::default(), Messenger::silent());
        system.initialize().unwrap();
        system
    }

    /// root -> {W1(pid=7), W2(pid=9) -> {W3(pid=7)}}
    fn sample_tree() -> FakeOpener {
        let opener = FakeOpener::new();
        opener.add_window(FAKE_ROOT, WindowId(11), Some(7));
        opener.add_window(FAKE_ROOT, WindowId(12), Some(9));
        opener.add_window(WindowId(12), WindowId(13), Some(7));
        opener
    }

    #[test]
    fn test_finds_nested_windows_of_process() {
        let opener = sample_tree();
        let system = initialized(&opener);

        let windows = system.get_windows_of_process(7).unwrap();
        let set: HashSet<_> = windows.iter().copied().collect();
        assert_eq!(set, HashSet::from([WindowId(11), WindowId(13)]));
        assert_eq!(windows.len(), 2);
        // Прямой порядок обхода
        assert_eq!(windows.as_slice(), &[WindowId(11), WindowId(13)]);

        assert_eq!(system.get_windows_of_process(9).unwrap().as_slice(), &[WindowId(12)]);
        assert!(system.get_windows_of_process(1234).unwrap().is_empty());
    }

    #[test]
    fn test_failed_subtree_query_is_soft() {
        let opener = sample_tree();
        opener.add_window(WindowId(13), WindowId(14), Some(7));
        {
            let mut state = opener.state.lock();
            state.broken_tree.insert(WindowId(12));
            state.broken_property.insert(WindowId(11));
        }
        let system = initialized(&opener);

        // Ветка W2 недоступна, у W1 не читается свойство
        assert!(system.get_windows_of_process(7).unwrap().is_empty());

        opener.state.lock().broken_tree.clear();
        let windows = system.get_windows_of_process(7).unwrap();
        assert_eq!(windows.as_slice(), &[WindowId(13), WindowId(14)]);
    }

    #[test]
    fn test_deep_tree_without_recursion() {
        let opener = FakeOpener::new();
        let mut parent = FAKE_ROOT;
        for i in 0..50_000u32 {
            let window = WindowId(100 + i);
            opener.add_window(parent, window, (i % 10_000 == 0).then_some(42));
            parent = window;
        }
        let system = initialized(&opener);

        assert_eq!(system.get_windows_of_process(42).unwrap().len(), 5);
    }

    #[test]
    fn test_no_duplicates_when_window_appears_twice() {
        let opener = sample_tree();
        // Окно встречается у двух родителей (переподвешено во время обхода)
        opener.add_window(WindowId(11), WindowId(13), None);
        let system = initialized(&opener);

        let windows = system.get_windows_of_process(7).unwrap();
        assert_eq!(windows.len(), 2);
    }

    #[test]
    fn test_missing_pid_atom_gives_empty_result() {
        let opener = sample_tree();
        opener.state.lock().pid_atom_exists = false;
        let system = initialized(&opener);

        assert!(system.get_windows_of_process(7).unwrap().is_empty());
    }
}
