//! SQL to logical plan.
//!
//! Supported: one `SELECT` over one or more tables (comma cross joins and
//! `[INNER] JOIN ... ON`), an optional `WHERE`, and a projection of column
//! references (optionally aliased) or `*`. Rows are produced by a nested loop over
//! the sources in `FROM` order; join conditions and the `WHERE` clause are folded
//! into a single filter.

use std::cmp::Ordering;
use std::sync::Arc;

use sqlparser::ast::{
    self, BinaryOperator, Expr, GroupByExpr, Ident, JoinConstraint, JoinOperator, ObjectName,
    ObjectNamePart, Query, Select, SelectItem, SetExpr, Statement as SqlStatement, TableFactor,
    UnaryOperator,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use gridsql_core::{ResultMetadata, Value};

use crate::catalog::{select_one, Catalog, Name, Table};
use crate::error::EngineError;

static NULL: Value = Value::Null;

fn name(ident: &Ident) -> Name<'_> {
    Name::new(&ident.value, ident.quote_style.is_some())
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// A value computed from the combined row of all sources.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Position in the combined row.
    Column(usize),
    Literal(Value),
}

impl Scalar {
    fn eval<'r>(&'r self, row: &'r [Value]) -> &'r Value {
        match self {
            Scalar::Column(i) => row.get(*i).unwrap_or(&NULL),
            Scalar::Literal(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    fn test(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::NotEq => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::LtEq => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::GtEq => ordering != Ordering::Less,
        }
    }
}

/// Three-valued filter expression. `None` is SQL unknown.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        left: Scalar,
        op: CmpOp,
        right: Scalar,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    IsNull(Scalar),
    IsNotNull(Scalar),
    /// A boolean column or literal used as a condition.
    Truth(Scalar),
}

impl Predicate {
    pub fn eval(&self, row: &[Value]) -> Option<bool> {
        match self {
            Predicate::Compare { left, op, right } => left
                .eval(row)
                .sql_cmp(right.eval(row))
                .map(|ordering| op.test(ordering)),
            Predicate::And(a, b) => match (a.eval(row), b.eval(row)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Predicate::Or(a, b) => match (a.eval(row), b.eval(row)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            Predicate::Not(p) => p.eval(row).map(|b| !b),
            Predicate::IsNull(s) => Some(s.eval(row).is_null()),
            Predicate::IsNotNull(s) => Some(!s.eval(row).is_null()),
            Predicate::Truth(s) => match s.eval(row) {
                Value::Bool(b) => Some(*b),
                _ => None,
            },
        }
    }

    fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }
}

/// One table in `FROM`, with its slice of the combined row.
#[derive(Debug, Clone)]
pub struct Source {
    pub table: Arc<Table>,
    /// Alias, or the table name when unaliased.
    pub binding: String,
    pub offset: usize,
}

#[derive(Debug)]
pub struct LogicalPlan {
    sources: Vec<Source>,
    filter: Option<Predicate>,
    projection: Vec<usize>,
    metadata: Arc<ResultMetadata>,
}

impl LogicalPlan {
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    pub fn metadata(&self) -> Arc<ResultMetadata> {
        Arc::clone(&self.metadata)
    }

    /// `true` when the combined row passes the filter. Unknown rejects.
    pub fn accepts(&self, row: &[Value]) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |filter| filter.eval(row) == Some(true))
    }

    /// Output values of a combined row, in column-index order.
    pub fn project(&self, row: &[Value]) -> Vec<Value> {
        self.projection
            .iter()
            .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Parse `sql` as exactly one query.
pub fn parse(sql: &str) -> Result<Box<Query>, EngineError> {
    let mut statements = Parser::parse_sql(&GenericDialect {}, sql)?;
    if statements.len() != 1 {
        return Err(EngineError::unsupported(format!(
            "expected exactly one statement, got {}",
            statements.len()
        )));
    }
    match statements.remove(0) {
        SqlStatement::Query(query) => Ok(query),
        other => Err(EngineError::unsupported(format!(
            "only queries can be executed: {other}"
        ))),
    }
}

/// Parse and plan `sql` against `catalog`.
pub fn plan_query(sql: &str, catalog: &Catalog) -> Result<LogicalPlan, EngineError> {
    let query = parse(sql)?;
    let select = select_of(&query)?;
    Planner {
        catalog,
        sources: Vec::new(),
        width: 0,
    }
    .plan(select)
}

fn select_of(query: &Query) -> Result<&Select, EngineError> {
    if query.with.is_some() {
        return Err(EngineError::unsupported("WITH"));
    }
    if query.order_by.is_some() {
        return Err(EngineError::unsupported("ORDER BY"));
    }
    if query.limit_clause.is_some() {
        return Err(EngineError::unsupported("LIMIT / OFFSET"));
    }
    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select.as_ref(),
        other => return Err(EngineError::unsupported(format!("query body: {other}"))),
    };
    if select.distinct.is_some() {
        return Err(EngineError::unsupported("DISTINCT"));
    }
    if select.having.is_some() {
        return Err(EngineError::unsupported("HAVING"));
    }
    if !matches!(&select.group_by, GroupByExpr::Expressions(exprs, _) if exprs.is_empty()) {
        return Err(EngineError::unsupported("GROUP BY"));
    }
    if select.from.is_empty() {
        return Err(EngineError::unsupported("SELECT without FROM"));
    }
    Ok(select)
}

struct Planner<'c> {
    catalog: &'c Catalog,
    sources: Vec<Source>,
    width: usize,
}

impl Planner<'_> {
    fn plan(mut self, select: &Select) -> Result<LogicalPlan, EngineError> {
        let mut conditions = Vec::new();
        for from in &select.from {
            self.add_source(&from.relation)?;
            for join in &from.joins {
                let constraint = match &join.join_operator {
                    JoinOperator::Join(constraint) | JoinOperator::Inner(constraint) => constraint,
                    other => {
                        return Err(EngineError::unsupported(format!("join operator {other:?}")))
                    }
                };
                self.add_source(&join.relation)?;
                match constraint {
                    JoinConstraint::On(on) => conditions.push(self.predicate(on)?),
                    _ => return Err(EngineError::unsupported("join without an ON condition")),
                }
            }
        }
        if let Some(selection) = &select.selection {
            conditions.push(self.predicate(selection)?);
        }
        let filter = conditions.into_iter().reduce(Predicate::and);

        let mut labels = Vec::new();
        let mut projection = Vec::new();
        for item in &select.projection {
            match item {
                SelectItem::UnnamedExpr(expr) => {
                    let (index, label) = self.projected_column(expr)?;
                    projection.push(index);
                    labels.push(label);
                }
                SelectItem::ExprWithAlias { expr, alias } => {
                    let (index, _) = self.projected_column(expr)?;
                    projection.push(index);
                    labels.push(alias.value.clone());
                }
                SelectItem::Wildcard(_) => {
                    for source in &self.sources {
                        for (i, column) in source.table.columns.iter().enumerate() {
                            projection.push(source.offset + i);
                            labels.push(column.clone());
                        }
                    }
                }
                other => return Err(EngineError::unsupported(format!("select item {other}"))),
            }
        }

        tracing::debug!(
            sources = self.sources.len(),
            columns = labels.len(),
            filtered = filter.is_some(),
            "query planned",
        );
        Ok(LogicalPlan {
            sources: self.sources,
            filter,
            projection,
            metadata: Arc::new(ResultMetadata::new(labels)),
        })
    }

    fn add_source(&mut self, factor: &TableFactor) -> Result<(), EngineError> {
        let (object, alias) = match factor {
            TableFactor::Table { name, alias, .. } => (name, alias),
            other => return Err(EngineError::unsupported(format!("table factor {other}"))),
        };
        let table = self.resolve_table(object)?;
        let binding = alias
            .as_ref()
            .map(|a| a.name.value.clone())
            .unwrap_or_else(|| table.name.clone());
        if self.sources.iter().any(|s| s.binding == binding) {
            return Err(EngineError::Ambiguous(binding));
        }
        let width = table.columns.len();
        self.sources.push(Source {
            table,
            binding,
            offset: self.width,
        });
        self.width += width;
        Ok(())
    }

    fn resolve_table(&self, object: &ObjectName) -> Result<Arc<Table>, EngineError> {
        let parts = object
            .0
            .iter()
            .map(|part| match part {
                ObjectNamePart::Identifier(ident) => Ok(ident),
                #[allow(unreachable_patterns)]
                _ => Err(EngineError::unsupported(format!("table name {object}"))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        match parts.as_slice() {
            [table] => self.catalog.table(None, name(table)),
            [schema, table] => self.catalog.table(Some(name(schema)), name(table)),
            _ => Err(EngineError::unsupported(format!("table name {object}"))),
        }
    }

    /// Resolve a column reference to its position in the combined row.
    fn column(&self, parts: &[Ident]) -> Result<usize, EngineError> {
        let (schema, qualifier, column) = match parts {
            [column] => (None, None, column),
            [qualifier, column] => (None, Some(qualifier), column),
            [schema, qualifier, column] => (Some(schema), Some(qualifier), column),
            _ => {
                let shown: Vec<&str> = parts.iter().map(|p| p.value.as_str()).collect();
                return Err(EngineError::unsupported(format!(
                    "column reference {}",
                    shown.join(".")
                )));
            }
        };

        let in_scope: Vec<&Source> = self
            .sources
            .iter()
            .filter(|s| qualifier.map_or(true, |q| name(q).matches(&s.binding)))
            .filter(|s| schema.map_or(true, |q| name(q).matches(&s.table.schema)))
            .collect();
        if let (Some(qualifier), true) = (qualifier, in_scope.is_empty()) {
            return Err(EngineError::TableNotFound(qualifier.value.clone()));
        }

        let candidates = in_scope
            .iter()
            .flat_map(|s| {
                s.table
                    .columns
                    .iter()
                    .enumerate()
                    .map(move |(i, c)| (c.as_str(), s.offset + i))
            })
            .collect();
        select_one(&name(column), candidates)?.ok_or_else(|| {
            let shown = match qualifier {
                Some(q) => format!("{}.{}", q.value, column.value),
                None => column.value.clone(),
            };
            EngineError::ColumnNotFound(shown)
        })
    }

    /// A selected column: its position and its declared name.
    fn projected_column(&self, expr: &Expr) -> Result<(usize, String), EngineError> {
        let index = match expr {
            Expr::Identifier(ident) => self.column(std::slice::from_ref(ident))?,
            Expr::CompoundIdentifier(parts) => self.column(parts)?,
            Expr::Nested(inner) => return self.projected_column(inner),
            other => {
                return Err(EngineError::unsupported(format!(
                    "only column references can be selected, got {other}"
                )))
            }
        };
        Ok((index, self.label_of(index)))
    }

    fn label_of(&self, index: usize) -> String {
        self.sources
            .iter()
            .find(|s| index >= s.offset && index < s.offset + s.table.columns.len())
            .and_then(|s| s.table.columns.get(index - s.offset))
            .cloned()
            .unwrap_or_default()
    }

    fn scalar(&self, expr: &Expr) -> Result<Scalar, EngineError> {
        match expr {
            Expr::Identifier(ident) => Ok(Scalar::Column(self.column(std::slice::from_ref(ident))?)),
            Expr::CompoundIdentifier(parts) => Ok(Scalar::Column(self.column(parts)?)),
            Expr::Value(value) => literal(&value.value).map(Scalar::Literal),
            Expr::Nested(inner) => self.scalar(inner),
            Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: inner,
            } => match self.scalar(inner)? {
                Scalar::Literal(Value::Int(i)) => Ok(Scalar::Literal(Value::Int(-i))),
                Scalar::Literal(Value::Double(d)) => Ok(Scalar::Literal(Value::Double(-d))),
                _ => Err(EngineError::unsupported(format!("expression {expr}"))),
            },
            other => Err(EngineError::unsupported(format!("expression {other}"))),
        }
    }

    fn predicate(&self, expr: &Expr) -> Result<Predicate, EngineError> {
        match expr {
            Expr::BinaryOp { left, op, right } => {
                let op = match op {
                    BinaryOperator::And => {
                        return Ok(self.predicate(left)?.and(self.predicate(right)?))
                    }
                    BinaryOperator::Or => {
                        return Ok(Predicate::Or(
                            Box::new(self.predicate(left)?),
                            Box::new(self.predicate(right)?),
                        ))
                    }
                    BinaryOperator::Eq => CmpOp::Eq,
                    BinaryOperator::NotEq => CmpOp::NotEq,
                    BinaryOperator::Lt => CmpOp::Lt,
                    BinaryOperator::LtEq => CmpOp::LtEq,
                    BinaryOperator::Gt => CmpOp::Gt,
                    BinaryOperator::GtEq => CmpOp::GtEq,
                    other => return Err(EngineError::unsupported(format!("operator {other}"))),
                };
                Ok(Predicate::Compare {
                    left: self.scalar(left)?,
                    op,
                    right: self.scalar(right)?,
                })
            }
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: inner,
            } => Ok(Predicate::Not(Box::new(self.predicate(inner)?))),
            Expr::Nested(inner) => self.predicate(inner),
            Expr::IsNull(inner) => Ok(Predicate::IsNull(self.scalar(inner)?)),
            Expr::IsNotNull(inner) => Ok(Predicate::IsNotNull(self.scalar(inner)?)),
            Expr::Identifier(_) | Expr::CompoundIdentifier(_) | Expr::Value(_) => {
                Ok(Predicate::Truth(self.scalar(expr)?))
            }
            other => Err(EngineError::unsupported(format!("condition {other}"))),
        }
    }
}

fn literal(value: &ast::Value) -> Result<Value, EngineError> {
    match value {
        ast::Value::Number(text, _) => text
            .parse::<i64>()
            .map(Value::Int)
            .or_else(|_| text.parse::<f64>().map(Value::Double))
            .map_err(|_| EngineError::unsupported(format!("numeric literal {text}"))),
        ast::Value::SingleQuotedString(text) => Ok(Value::Text(text.clone())),
        ast::Value::Boolean(b) => Ok(Value::Bool(*b)),
        ast::Value::Null => Ok(Value::Null),
        other => Err(EngineError::unsupported(format!("literal {other}"))),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gridsql_core::{DiscoveryConfig, LocatorConfig, ModelDescriptor, NamingResolver};
    use gridsql_memgrid::{bookshop, LocatorDirectory, MemClientFactory};
    use rstest::rstest;

    use crate::GRID_SCHEMA_FACTORY;

    fn catalog() -> Catalog {
        let directory = Arc::new(LocatorDirectory::new());
        directory.register("localhost", 10334, Arc::new(bookshop("server1")));
        let factory = MemClientFactory::new(directory);
        let model = ModelDescriptor::single(
            "TEST",
            GRID_SCHEMA_FACTORY,
            DiscoveryConfig::Locator(LocatorConfig::new("localhost", 10334, "gridsql.domain.*")),
            vec!["BookMaster".into(), "BookInventory".into()],
        );
        Catalog::from_model(&model, &factory, &NamingResolver::new()).unwrap()
    }

    fn labels(plan: &LogicalPlan) -> Vec<String> {
        plan.metadata()
            .columns()
            .iter()
            .map(|c| c.label.clone())
            .collect()
    }

    #[test]
    fn fixed_join_query_plans_three_columns() {
        let plan = plan_query(
            r#"SELECT "b"."author", "b"."retailCost", "i"."quantityInStock"
               FROM "TEST"."BookMaster" AS "b"
               INNER JOIN "TEST"."BookInventory" AS "i" ON "b"."itemNumber" = "i"."itemNumber"
               WHERE "b"."retailCost" > 0"#,
            &catalog(),
        )
        .unwrap();
        assert_eq!(labels(&plan), vec!["author", "retailCost", "quantityInStock"]);
        assert_eq!(plan.sources().len(), 2);
        assert_eq!(plan.sources()[1].binding, "i");
        assert!(matches!(plan.filter(), Some(Predicate::And(_, _))));
    }

    #[test]
    fn wildcard_and_aliases() {
        let catalog = catalog();
        let star = plan_query("SELECT * FROM BookInventory", &catalog).unwrap();
        assert_eq!(labels(&star), vec!["itemNumber", "warehouse", "quantityInStock"]);

        let aliased = plan_query("SELECT title AS name FROM bookmaster", &catalog).unwrap();
        assert_eq!(labels(&aliased), vec!["name"]);
    }

    #[rstest]
    #[case("SELECT author FROM Nope", "table 'Nope' not found")]
    #[case("SELECT nope FROM BookMaster", "column 'nope' not found")]
    #[case("SELECT itemNumber FROM BookMaster, BookInventory", "'itemNumber' is ambiguous")]
    #[case(r#"SELECT "AUTHOR" FROM BookMaster"#, "column 'AUTHOR' not found")]
    #[case("SELECT x.author FROM BookMaster b", "table 'x' not found")]
    #[case("SELECT author FROM BookMaster ORDER BY author", "unsupported SQL: ORDER BY")]
    #[case("SELECT COUNT(*) FROM BookMaster", "unsupported SQL")]
    #[case("DELETE FROM BookMaster", "unsupported SQL")]
    #[case("SELECT author FROM BookMaster; SELECT 1", "exactly one statement")]
    fn rejected_queries(#[case] sql: &str, #[case] expected: &str) {
        let err = plan_query(sql, &catalog()).unwrap_err();
        assert!(err.to_string().contains(expected), "{sql}: got {err}");
    }

    #[test]
    fn malformed_sql_is_a_parse_error() {
        let err = plan_query("SELEC author FRM", &catalog()).unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)), "got: {err}");
    }

    #[rstest]
    #[case(CmpOp::Gt, 34.99, 0.0, Some(true))]
    #[case(CmpOp::Gt, 0.0, 0.0, Some(false))]
    #[case(CmpOp::LtEq, 0.0, 0.0, Some(true))]
    #[case(CmpOp::NotEq, 1.0, 2.0, Some(true))]
    fn comparisons(
        #[case] op: CmpOp,
        #[case] left: f64,
        #[case] right: f64,
        #[case] expected: Option<bool>,
    ) {
        let predicate = Predicate::Compare {
            left: Scalar::Column(0),
            op,
            right: Scalar::Literal(Value::Double(right)),
        };
        assert_eq!(predicate.eval(&[Value::Double(left)]), expected);
    }

    #[test]
    fn null_is_unknown_and_unknown_rejects() {
        let gt = Predicate::Compare {
            left: Scalar::Column(0),
            op: CmpOp::Gt,
            right: Scalar::Literal(Value::Int(0)),
        };
        assert_eq!(gt.eval(&[Value::Null]), None);
        assert_eq!(Predicate::Not(Box::new(gt.clone())).eval(&[Value::Null]), None);
        assert_eq!(
            Predicate::Or(Box::new(gt), Box::new(Predicate::IsNull(Scalar::Column(0))))
                .eval(&[Value::Null]),
            Some(true)
        );
    }

    #[test]
    fn where_clause_filters_combined_rows() {
        let catalog = catalog();
        let plan = plan_query(
            "SELECT author FROM BookMaster WHERE retailCost > 0 AND NOT author = 'Clarence Meeks'",
            &catalog,
        )
        .unwrap();
        let table = &plan.sources()[0].table;
        let row_of = |author: &str, cost: f64| -> Vec<Value> {
            table
                .columns
                .iter()
                .map(|c| match c.as_str() {
                    "author" => Value::from(author),
                    "retailCost" => Value::Double(cost),
                    _ => Value::Null,
                })
                .collect()
        };
        assert!(plan.accepts(&row_of("Daisy Mae West", 34.99)));
        assert!(!plan.accepts(&row_of("Clarence Meeks", 11.99)));
        assert!(!plan.accepts(&row_of("Bookshop Staff", 0.0)));
        assert_eq!(
            plan.project(&row_of("Jim Heavisides", 59.99)),
            vec![Value::from("Jim Heavisides")]
        );
    }

    #[test]
    fn negative_literals_are_folded() {
        let plan =
            plan_query("SELECT author FROM BookMaster WHERE retailCost > -1", &catalog()).unwrap();
        match plan.filter() {
            Some(Predicate::Compare { right, .. }) => {
                assert_eq!(right, &Scalar::Literal(Value::Int(-1)))
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }
}
