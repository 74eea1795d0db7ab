//! A small in-memory library with three access-logged controllers.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example library
//!
//! Every routed call prints one access line, e.g.
//!   POST /book/add, req={title:"Dune",author:"Herbert"}, rsp={id:1,title:"Dune",author:"Herbert"}, time=0
//!   GET /student/7, error=Student is not found by ID 7, time=0

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use routelog::{
    Args, Controller, Error, MethodDescriptor, Param, Returned, Signature, instrument_traced,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let library = Arc::new(Library::default());
    let books = instrument_traced(BookController(library.clone()));
    let students = instrument_traced(StudentController(library.clone()));
    let desk = instrument_traced(LibraryController(library));

    let add_book = Signature::new("add").param::<AddBook>();
    books.call(&add_book, Args::new().arg(AddBook::new("Dune", "Herbert")))?.await?;
    books.call(&add_book, Args::new().arg(AddBook::new("Solaris", "Lem")))?.await?;

    let add_student = Signature::new("add").param::<AddStudent>();
    students.call(&add_student, Args::new().arg(AddStudent::new("Ann", "Lee")))?.await?;

    let by_id = Signature::new("getById").param::<i64>();
    books.call(&by_id, Args::new().arg(2_i64))?.await?;
    if let Err(err) = students.call(&by_id, Args::new().arg(7_i64))?.await {
        warn!(%err, "lookup failed");
    }

    let bind = Signature::new("bind").param::<Key>();
    desk.call(&bind, Args::new().arg(Key { student_id: 1, book_id: 1 }))?.await?;

    let bound = Signature::new("bound").param::<i64>().param::<i64>();
    desk.call(&bound, Args::new().arg(1_i64).arg(1_i64))?.await?;

    let shelf = Signature::new("getBoundBooks").param::<i64>();
    desk.call(&shelf, Args::new().arg(1_i64))?.await?;

    let unbind = Signature::new("unbind").param::<Key>();
    desk.call(&unbind, Args::new().arg(Key { student_id: 1, book_id: 1 }))?.await?;

    let remove = Signature::new("remove").param::<i64>();
    books.call(&remove, Args::new().arg(2_i64))?.await?;

    books.call(&Signature::new("getAll"), Args::new())?.await?;
    students.call(&Signature::new("getAll"), Args::new())?.await?;
    Ok(())
}

// ── Controllers ───────────────────────────────────────────────────────────────

struct BookController(Arc<Library>);

impl Controller for BookController {
    fn base_path(&self) -> &str {
        "/book"
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("add").post("add").param(Param::of::<AddBook>("dto").body()),
            MethodDescriptor::new("getAll").get("all"),
            MethodDescriptor::new("getById").get("{id}").param(Param::of::<i64>("id").path_variable()),
            MethodDescriptor::new("remove")
                .post("{id}/remove")
                .param(Param::of::<i64>("id").path_variable()),
        ]
    }

    fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
        let lib = self.0.clone();
        Ok(match method.name() {
            "add" => {
                let dto = args.required::<AddBook>(0)?.clone();
                Returned::deferred(async move { Ok(Some(lib.add_book(dto))) })
            }
            "getAll" => Returned::deferred(async move { Ok(Some(lib.books())) }),
            "getById" => {
                let id = *args.required::<i64>(0)?;
                Returned::deferred(async move { lib.book(id).map(Some) })
            }
            "remove" => {
                let id = *args.required::<i64>(0)?;
                Returned::deferred_empty(async move { lib.remove_book(id) })
            }
            _ => return Err(Error::UnknownMethod(method.to_string())),
        })
    }
}

struct StudentController(Arc<Library>);

impl Controller for StudentController {
    fn base_path(&self) -> &str {
        "/student"
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("add").post("add").param(Param::of::<AddStudent>("dto").body()),
            MethodDescriptor::new("getAll").get("all"),
            MethodDescriptor::new("getById").get("{id}").param(Param::of::<i64>("id").path_variable()),
            MethodDescriptor::new("remove")
                .post("{id}/remove")
                .param(Param::of::<i64>("id").path_variable()),
        ]
    }

    fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
        let lib = self.0.clone();
        Ok(match method.name() {
            "add" => {
                let dto = args.required::<AddStudent>(0)?.clone();
                Returned::deferred(async move { Ok(Some(lib.add_student(dto))) })
            }
            "getAll" => Returned::deferred(async move { Ok(Some(lib.students())) }),
            "getById" => {
                let id = *args.required::<i64>(0)?;
                Returned::deferred(async move { lib.student(id).map(Some) })
            }
            "remove" => {
                let id = *args.required::<i64>(0)?;
                Returned::deferred_empty(async move { lib.remove_student(id) })
            }
            _ => return Err(Error::UnknownMethod(method.to_string())),
        })
    }
}

struct LibraryController(Arc<Library>);

impl Controller for LibraryController {
    fn base_path(&self) -> &str {
        "/library"
    }

    fn methods(&self) -> Vec<MethodDescriptor> {
        vec![
            MethodDescriptor::new("bind").post("bind").param(Param::of::<Key>("key").body()),
            MethodDescriptor::new("unbind").post("unbind").param(Param::of::<Key>("key").body()),
            MethodDescriptor::new("bound")
                .get("student/{studentId}/bound/{bookId}")
                .param(Param::of::<i64>("studentId").path_variable())
                .param(Param::of::<i64>("bookId").path_variable()),
            MethodDescriptor::new("getBoundBooks")
                .get("student/{studentId}/all")
                .param(Param::of::<i64>("studentId").path_variable()),
        ]
    }

    fn call(&self, method: &Signature, args: Args) -> Result<Returned, Error> {
        let lib = self.0.clone();
        Ok(match method.name() {
            "bind" => {
                let key = *args.required::<Key>(0)?;
                Returned::deferred_empty(async move { lib.bind(key, true) })
            }
            "unbind" => {
                let key = *args.required::<Key>(0)?;
                Returned::deferred_empty(async move { lib.bind(key, false) })
            }
            "bound" => {
                let key = Key {
                    student_id: *args.required::<i64>(0)?,
                    book_id: *args.required::<i64>(1)?,
                };
                Returned::deferred(async move { lib.is_bound(key).map(|b| Some(Bound(b))) })
            }
            "getBoundBooks" => {
                let id = *args.required::<i64>(0)?;
                Returned::deferred(async move { lib.bound_books(id).map(Some) })
            }
            _ => return Err(Error::UnknownMethod(method.to_string())),
        })
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Library {
    store: Mutex<Store>,
}

#[derive(Default)]
struct Store {
    books: BTreeMap<i64, Book>,
    students: BTreeMap<i64, Student>,
    bindings: BTreeSet<(i64, i64)>,
    book_seq: i64,
    student_seq: i64,
}

impl Store {
    fn book(&self, id: i64) -> Result<&Book, Error> {
        self.books.get(&id).ok_or_else(|| Error::msg(format!("Book is not found by ID {id}")))
    }

    fn student(&self, id: i64) -> Result<&Student, Error> {
        self.students.get(&id).ok_or_else(|| Error::msg(format!("Student is not found by ID {id}")))
    }
}

impl Library {
    fn add_book(&self, dto: AddBook) -> Book {
        let mut store = self.store.lock();
        store.book_seq += 1;
        let book = Book { id: store.book_seq, title: dto.title, author: dto.author };
        store.books.insert(book.id, book.clone());
        book
    }

    fn books(&self) -> Listed<Book> {
        Listed(self.store.lock().books.values().cloned().collect())
    }

    fn book(&self, id: i64) -> Result<Book, Error> {
        self.store.lock().book(id).cloned()
    }

    fn remove_book(&self, id: i64) -> Result<(), Error> {
        let mut store = self.store.lock();
        store.book(id)?;
        store.books.remove(&id);
        Ok(())
    }

    fn add_student(&self, dto: AddStudent) -> Student {
        let mut store = self.store.lock();
        store.student_seq += 1;
        let student = Student { id: store.student_seq, first_name: dto.first_name, last_name: dto.last_name };
        store.students.insert(student.id, student.clone());
        student
    }

    fn students(&self) -> Listed<Student> {
        Listed(self.store.lock().students.values().cloned().collect())
    }

    fn student(&self, id: i64) -> Result<Student, Error> {
        self.store.lock().student(id).cloned()
    }

    fn remove_student(&self, id: i64) -> Result<(), Error> {
        let mut store = self.store.lock();
        store.student(id)?;
        store.students.remove(&id);
        Ok(())
    }

    fn bind(&self, key: Key, bound: bool) -> Result<(), Error> {
        let mut store = self.store.lock();
        store.student(key.student_id)?;
        store.book(key.book_id)?;
        if bound {
            store.bindings.insert((key.student_id, key.book_id));
        } else {
            store.bindings.remove(&(key.student_id, key.book_id));
        }
        Ok(())
    }

    fn is_bound(&self, key: Key) -> Result<bool, Error> {
        let store = self.store.lock();
        store.student(key.student_id)?;
        store.book(key.book_id)?;
        Ok(store.bindings.contains(&(key.student_id, key.book_id)))
    }

    fn bound_books(&self, student_id: i64) -> Result<Listed<Book>, Error> {
        let store = self.store.lock();
        store.student(student_id)?;
        let books = store
            .bindings
            .iter()
            .filter(|(s, _)| *s == student_id)
            .filter_map(|(_, b)| store.books.get(b).cloned())
            .collect();
        Ok(Listed(books))
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Book {
    id: i64,
    title: String,
    author: String,
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{id:{},title:\"{}\",author:\"{}\"}}", self.id, self.title, self.author)
    }
}

#[derive(Clone)]
struct Student {
    id: i64,
    first_name: String,
    last_name: String,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{id:{},firstName:\"{}\",lastName:\"{}\"}}",
            self.id, self.first_name, self.last_name
        )
    }
}

#[derive(Clone)]
struct AddBook {
    title: String,
    author: String,
}

impl AddBook {
    fn new(title: &str, author: &str) -> Self {
        Self { title: title.into(), author: author.into() }
    }
}

impl fmt::Display for AddBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{title:\"{}\",author:\"{}\"}}", self.title, self.author)
    }
}

#[derive(Clone)]
struct AddStudent {
    first_name: String,
    last_name: String,
}

impl AddStudent {
    fn new(first_name: &str, last_name: &str) -> Self {
        Self { first_name: first_name.into(), last_name: last_name.into() }
    }
}

impl fmt::Display for AddStudent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{firstName:\"{}\",lastName:\"{}\"}}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Copy)]
struct Key {
    student_id: i64,
    book_id: i64,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{studentId:{},bookId:{}}}", self.student_id, self.book_id)
    }
}

struct Bound(bool);

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{isBound:{}}}", self.0)
    }
}

struct Listed<T>(Vec<T>);

impl<T: fmt::Display> fmt::Display for Listed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("]")
    }
}
